//! Query Consistency Tests
//!
//! Tests for read-side guarantees:
//! - Stale index entries are skipped, never reported as errors
//! - Unindexed fields and bad operands are rejected at plan time
//! - Deadlines bound every store call
//! - Results match a brute-force filter over the same documents

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use kvindex::{
    Database, Deadline, Document, DocumentModel, FieldDef, Filter, IndexConfig, KvStore,
    MemoryStore, Operator,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn product_model() -> DocumentModel {
    DocumentModel::new("Product")
        .field("category", FieldDef::string().indexed())
        .field("brand", FieldDef::string().nullable().indexed())
        .field("price", FieldDef::int().indexed())
        .field("notes", FieldDef::string())
}

fn open_with(store: MemoryStore, config: IndexConfig) -> Database<MemoryStore> {
    let db = Database::with_config(Arc::new(store), config.quiet()).unwrap();
    db.register(&product_model()).unwrap();
    db
}

fn open() -> Database<MemoryStore> {
    open_with(MemoryStore::new(), IndexConfig::default())
}

fn product(id: &str, category: &str, price: i64) -> Document {
    Document::with_id("Product", id)
        .set("category", category)
        .set("price", price)
}

// =============================================================================
// Stale Entries
// =============================================================================

/// An index entry whose document vanished is skipped and counted.
#[tokio::test]
async fn test_stale_entry_skipped() {
    let db = open();
    db.insert(&product("live", "books", 10)).await.unwrap();
    db.insert(&product("ghost", "books", 20)).await.unwrap();

    // primary document removed behind the index's back
    let key = db.keys().document("Product", "ghost");
    db.store().delete(&key).await.unwrap();

    let result = db
        .find("Product", &Filter::new().eq("category", "books"))
        .await
        .unwrap();

    assert_eq!(result.ids(), vec!["live"]);
    assert_eq!(result.candidate_count, 2);
    assert_eq!(result.stale_skipped, 1);
    assert_eq!(db.metrics().snapshot().stale_skipped, 1);

    // candidates are index-only
    let ids = db
        .find_ids("Product", &Filter::new().eq("category", "books"))
        .await
        .unwrap();
    assert_eq!(ids, vec!["ghost".to_string(), "live".to_string()]);
}

// =============================================================================
// Plan-Time Rejection
// =============================================================================

/// Filtering on a field without an index is an error, never a scan.
#[tokio::test]
async fn test_unindexed_field_rejected() {
    let db = open();
    db.insert(&product("p1", "books", 10).set("notes", "signed"))
        .await
        .unwrap();
    let reads_before = db.metrics().snapshot().queries_executed;

    let err = db
        .find("Product", &Filter::new().eq("notes", "signed"))
        .await
        .unwrap_err();

    assert!(err.is_unindexed_field());
    assert_eq!(err.code(), "KVIDX_QUERY_UNINDEXED_FIELD");
    assert_eq!(db.metrics().snapshot().queries_executed, reads_before);
    assert_eq!(db.metrics().snapshot().queries_rejected, 1);
}

/// A misspelled operator suffix becomes part of the field name.
#[tokio::test]
async fn test_unknown_suffix_is_unindexed() {
    let db = open();

    let err = db
        .find("Product", &Filter::parse([("price__gtee", json!(3))]))
        .await
        .unwrap_err();

    assert!(err.is_unindexed_field());
}

/// Range operators need a RANGE index.
#[tokio::test]
async fn test_range_operator_on_exact_field() {
    let db = open();

    let err = db
        .find("Product", &Filter::new().gte("category", "a"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "KVIDX_QUERY_UNSUPPORTED_OPERATOR");
}

/// Non-numeric bounds on a RANGE field are invalid.
#[tokio::test]
async fn test_non_numeric_bound() {
    let db = open();

    let err = db
        .find("Product", &Filter::new().lte("price", "cheap"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "KVIDX_QUERY_INVALID_VALUE");
}

/// Explain shows the lookups, ordered by field, or the rejection.
#[tokio::test]
async fn test_explain() {
    let db = open();

    let explain = db.explain(
        "Product",
        &Filter::new().gte("price", 10).eq("category", "books"),
    );
    assert!(explain.accepted);
    assert_eq!(explain.lookups.len(), 2);
    assert!(explain.lookups[0].contains("category"));
    assert!(explain.lookups[1].contains("price"));
    assert!(explain.to_string().contains("ACCEPTED"));

    let explain = db.explain("Product", &Filter::new().eq("notes", "x"));
    assert!(!explain.accepted);
    assert_eq!(
        explain.rejection_code.as_deref(),
        Some("KVIDX_QUERY_UNINDEXED_FIELD")
    );
}

// =============================================================================
// Deadlines
// =============================================================================

/// A store slower than the configured budget surfaces a timeout.
#[tokio::test]
async fn test_configured_timeout() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(50));
    let db = open_with(store, IndexConfig::default().with_timeout_ms(5));

    let err = db.insert(&product("p1", "books", 10)).await.unwrap_err();
    assert!(err.is_store_unavailable());
    assert_eq!(err.code(), "KVIDX_STORE_TIMEOUT");

    let err = db.find("Product", &Filter::new()).await.unwrap_err();
    assert!(err.is_store_unavailable());
    assert_eq!(err.code(), "KVIDX_EXECUTION_STORE_FAILED");
}

/// A caller-supplied deadline overrides the configured budget.
#[tokio::test]
async fn test_caller_deadline() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(5));
    let db = open_with(store, IndexConfig::default().with_timeout_ms(1));

    db.insert_with_deadline(&product("p1", "books", 10), Deadline::none())
        .await
        .unwrap();

    let result = db
        .find_with_deadline(
            "Product",
            &Filter::new().eq("category", "books"),
            Deadline::after(Duration::from_secs(5)),
        )
        .await
        .unwrap();
    assert_eq!(result.ids(), vec!["p1"]);
}

/// Document reads of one query stay under the configured limit.
#[tokio::test]
async fn test_fetch_concurrency_bounded() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(2));
    let db = open_with(store, IndexConfig::default().with_fetch_concurrency(4));
    for i in 0..24 {
        db.insert(&product(&format!("p{:02}", i), "books", i))
            .await
            .unwrap();
    }
    // inserts run one call at a time
    assert_eq!(db.store().peak_in_flight(), 1);

    let result = db.find("Product", &Filter::new()).await.unwrap();

    assert_eq!(result.len(), 24);
    assert_eq!(result.ids()[0], "p00");
    let peak = db.store().peak_in_flight();
    assert!(peak > 1 && peak <= 4, "peak in flight: {}", peak);
}

// =============================================================================
// Brute-Force Oracle
// =============================================================================

const CATEGORIES: [&str; 4] = ["books", "games", "music", "tools"];
const BRANDS: [&str; 3] = ["acme", "globex", "initech"];

fn random_doc(rng: &mut StdRng, id: &str) -> Document {
    let mut doc = product(
        id,
        CATEGORIES[rng.gen_range(0..CATEGORIES.len())],
        rng.gen_range(0..1000),
    );
    if rng.gen_bool(0.6) {
        doc = doc.set("brand", BRANDS[rng.gen_range(0..BRANDS.len())]);
    }
    doc
}

fn random_filter(rng: &mut StdRng) -> Filter {
    let mut filter = Filter::new();
    if rng.gen_bool(0.5) {
        filter = filter.eq("category", CATEGORIES[rng.gen_range(0..CATEGORIES.len())]);
    }
    if rng.gen_bool(0.3) {
        filter = filter.eq("brand", BRANDS[rng.gen_range(0..BRANDS.len())]);
    }
    if rng.gen_bool(0.5) {
        let bound = rng.gen_range(0..1000);
        filter = if rng.gen_bool(0.5) {
            filter.gte("price", bound)
        } else {
            filter.gt("price", bound)
        };
    }
    if rng.gen_bool(0.5) {
        let bound = rng.gen_range(0..1000);
        filter = if rng.gen_bool(0.5) {
            filter.lte("price", bound)
        } else {
            filter.lt("price", bound)
        };
    }
    filter
}

fn matches(doc: &Document, filter: &Filter) -> bool {
    filter.predicates().iter().all(|p| {
        let Some(value) = doc.value(&p.field) else {
            return false;
        };
        match p.op {
            Operator::Eq => value == &p.value,
            _ => {
                let (Some(v), Some(bound)) = (value.as_f64(), p.value.as_f64()) else {
                    return false;
                };
                match p.op {
                    Operator::Gte => v >= bound,
                    Operator::Gt => v > bound,
                    Operator::Lte => v <= bound,
                    Operator::Lt => v < bound,
                    Operator::Eq => unreachable!(),
                }
            }
        }
    })
}

/// `find` agrees with a brute-force filter after random inserts, updates
/// and deletes.
#[tokio::test]
async fn test_find_matches_oracle() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let db = open_with(MemoryStore::without_batches(), IndexConfig::default());
    let mut live: BTreeMap<String, Document> = BTreeMap::new();

    for i in 0..80 {
        let id = format!("d{:03}", i);
        let doc = random_doc(&mut rng, &id);
        db.insert(&doc).await.unwrap();
        live.insert(id, doc);
    }

    for _ in 0..60 {
        let ids: Vec<String> = live.keys().cloned().collect();
        let id = ids[rng.gen_range(0..ids.len())].clone();
        if rng.gen_bool(0.3) {
            assert!(db.delete("Product", &id).await.unwrap());
            live.remove(&id);
        } else {
            let doc = random_doc(&mut rng, &id);
            db.update(&doc).await.unwrap();
            live.insert(id, doc);
        }
    }

    for _ in 0..200 {
        let filter = random_filter(&mut rng);
        let expected: Vec<&str> = live
            .values()
            .filter(|doc| matches(doc, &filter))
            .map(|doc| doc.id.as_str())
            .collect();

        let result = db.find("Product", &filter).await.unwrap();

        assert_eq!(result.ids(), expected, "filter: {:?}", filter);
        assert_eq!(result.stale_skipped, 0);
    }

    let all = db.find("Product", &Filter::new()).await.unwrap();
    assert_eq!(all.len(), live.len());
}

/// Documents without a brand never match a brand filter.
#[tokio::test]
async fn test_missing_brand_never_matches() {
    let db = open();
    db.insert(&product("p1", "books", 10)).await.unwrap();
    db.insert(&product("p2", "books", 10).set("brand", Value::Null))
        .await
        .unwrap();

    for brand in BRANDS {
        let result = db
            .find("Product", &Filter::new().eq("brand", brand))
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
