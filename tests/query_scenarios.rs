//! Query Scenario Tests
//!
//! End-to-end behaviour of `find` over a `MemoryStore`:
//! - Equality lookups on EXACT indexes
//! - Bounded lookups on RANGE indexes
//! - AND-combination across fields
//! - Deleted documents disappear from every index

use std::sync::Arc;

use kvindex::{Database, Document, DocumentModel, FieldDef, Filter, IndexConfig, MemoryStore};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn product_model() -> DocumentModel {
    DocumentModel::new("Product")
        .field("name", FieldDef::string())
        .field("category", FieldDef::string().indexed())
        .field("brand", FieldDef::string().nullable().indexed())
        .field("price", FieldDef::float().indexed())
}

fn open() -> Database<MemoryStore> {
    let db = Database::with_config(Arc::new(MemoryStore::new()), IndexConfig::default().quiet())
        .unwrap();
    db.register(&product_model()).unwrap();
    db
}

fn product(id: &str, category: &str, price: f64) -> Document {
    Document::with_id("Product", id)
        .set("name", format!("Product {}", id))
        .set("category", category)
        .set("price", price)
}

async fn prices(db: &Database<MemoryStore>, filter: Filter) -> Vec<f64> {
    let mut prices: Vec<f64> = db
        .find("Product", &filter)
        .await
        .unwrap()
        .iter()
        .filter_map(|d| d.value("price").and_then(|v| v.as_f64()))
        .collect();
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap());
    prices
}

async fn catalogue() -> Database<MemoryStore> {
    let db = open();
    db.insert(&product("p1", "electronics", 999.0)).await.unwrap();
    db.insert(&product("p2", "electronics", 599.0)).await.unwrap();
    db.insert(&product("p3", "furniture", 299.0)).await.unwrap();
    db.insert(&product("p4", "furniture", 149.0)).await.unwrap();
    db
}

// =============================================================================
// Mixed Catalogue
// =============================================================================

/// Equality on an EXACT field returns exactly the bucket.
#[tokio::test]
async fn test_exact_match() {
    let db = catalogue().await;

    let result = db
        .find("Product", &Filter::new().eq("category", "electronics"))
        .await
        .unwrap();

    assert_eq!(result.ids(), vec!["p1", "p2"]);
    assert!(result
        .iter()
        .all(|d| d.value("category") == Some(&json!("electronics"))));
}

/// Lower bound on a RANGE field.
#[tokio::test]
async fn test_gte_returns_priciest() {
    let db = catalogue().await;
    assert_eq!(prices(&db, Filter::new().gte("price", 500)).await, vec![599.0, 999.0]);
}

/// Upper bound on a RANGE field.
#[tokio::test]
async fn test_lte_returns_cheapest() {
    let db = catalogue().await;
    assert_eq!(prices(&db, Filter::new().lte("price", 299)).await, vec![149.0, 299.0]);
}

/// Strict bounds exclude the boundary value.
#[tokio::test]
async fn test_strict_bounds() {
    let db = catalogue().await;
    assert_eq!(prices(&db, Filter::new().gt("price", 299)).await, vec![599.0, 999.0]);
    assert_eq!(prices(&db, Filter::new().lt("price", 599)).await, vec![149.0, 299.0]);
}

/// Predicates on different fields are AND-combined.
#[tokio::test]
async fn test_combined_filters() {
    let db = catalogue().await;

    let filter = Filter::new().eq("category", "furniture").gte("price", 200);
    let result = db.find("Product", &filter).await.unwrap();

    assert_eq!(result.ids(), vec!["p3"]);
}

/// Keyword-style filters parse their operator suffixes.
#[tokio::test]
async fn test_keyword_filters() {
    let db = catalogue().await;

    let filter = Filter::parse([("category", json!("electronics")), ("price__lt", json!(900))]);
    let result = db.find("Product", &filter).await.unwrap();

    assert_eq!(result.ids(), vec!["p2"]);
}

/// A filter nothing satisfies returns an empty result, not an error.
#[tokio::test]
async fn test_no_results() {
    let db = catalogue().await;

    let result = db
        .find("Product", &Filter::new().eq("category", "garden"))
        .await
        .unwrap();
    assert!(result.is_empty());

    let result = db
        .find("Product", &Filter::new().gte("price", 5000))
        .await
        .unwrap();
    assert!(result.is_empty());
}

/// Contradictory bounds never reach the store.
#[tokio::test]
async fn test_contradictory_bounds_are_empty() {
    let db = catalogue().await;

    let filter = Filter::new().gte("price", 700).lte("price", 300);
    assert!(db.explain("Product", &filter).unsatisfiable);
    assert!(db.find("Product", &filter).await.unwrap().is_empty());
}

/// The empty filter returns every live document once.
#[tokio::test]
async fn test_find_all() {
    let db = catalogue().await;

    let result = db.find("Product", &Filter::new()).await.unwrap();

    assert_eq!(result.ids(), vec!["p1", "p2", "p3", "p4"]);
    assert_eq!(result.candidate_count, 4);
    assert_eq!(result.stale_skipped, 0);
}

/// Null values in a nullable indexed field are left out of its index.
#[tokio::test]
async fn test_optional_brand() {
    let db = open();
    db.insert(&product("p1", "electronics", 10.0).set("brand", "Acme"))
        .await
        .unwrap();
    db.insert(&product("p2", "electronics", 20.0).set("brand", serde_json::Value::Null))
        .await
        .unwrap();
    db.insert(&product("p3", "electronics", 30.0)).await.unwrap();

    let result = db
        .find("Product", &Filter::new().eq("brand", "Acme"))
        .await
        .unwrap();
    assert_eq!(result.ids(), vec!["p1"]);

    let all = db.find("Product", &Filter::new()).await.unwrap();
    assert_eq!(all.len(), 3);
}

// =============================================================================
// Price Ladder
// =============================================================================

/// Ten documents priced 100..=1000; a closed range picks exactly five.
#[tokio::test]
async fn test_between_range() {
    let db = open();
    for i in 1..=10 {
        let price = (i * 100) as f64;
        db.insert(&product(&format!("p{:02}", i), "ladder", price))
            .await
            .unwrap();
    }

    let found = prices(&db, Filter::new().gte("price", 300).lte("price", 700)).await;

    assert_eq!(found, vec![300.0, 400.0, 500.0, 600.0, 700.0]);
}

/// Equality on a RANGE field is the degenerate interval.
#[tokio::test]
async fn test_eq_on_range_field() {
    let db = catalogue().await;

    let result = db
        .find("Product", &Filter::new().eq("price", 299))
        .await
        .unwrap();

    assert_eq!(result.ids(), vec!["p3"]);
}

// =============================================================================
// Delete Cleanup
// =============================================================================

/// After delete, the document is gone from queries and from every index.
#[tokio::test]
async fn test_delete_cleans_every_index() {
    let db = open();
    let doc = product("gone", "books", 42.0).set("brand", "Acme");
    db.insert(&doc).await.unwrap();

    assert!(db.delete("Product", "gone").await.unwrap());

    assert!(db.find("Product", &Filter::new()).await.unwrap().is_empty());
    assert!(db
        .find_ids("Product", &Filter::new().eq("category", "books"))
        .await
        .unwrap()
        .is_empty());
    assert!(db
        .find_ids("Product", &Filter::new().eq("brand", "Acme"))
        .await
        .unwrap()
        .is_empty());
    assert!(db
        .find_ids("Product", &Filter::new().gte("price", 0))
        .await
        .unwrap()
        .is_empty());

    let keys = db.keys();
    assert!(db.store().is_absent(&keys.exact_bucket("Product", "category", "books")));
    assert!(db.store().is_absent(&keys.exact_bucket("Product", "brand", "Acme")));
    assert!(db.store().is_absent(&keys.range_index("Product", "price")));
    assert!(db.store().is_absent(&keys.document("Product", "gone")));
    assert!(db.store().keys().is_empty());
}

/// Deleting one document leaves its neighbours indexed.
#[tokio::test]
async fn test_delete_keeps_neighbours() {
    let db = catalogue().await;

    db.delete("Product", "p1").await.unwrap();

    let result = db
        .find("Product", &Filter::new().eq("category", "electronics"))
        .await
        .unwrap();
    assert_eq!(result.ids(), vec!["p2"]);
}

// =============================================================================
// Collection Boundaries
// =============================================================================

fn order_model() -> DocumentModel {
    DocumentModel::new("Order")
        .field("category", FieldDef::string().indexed())
        .field("price", FieldDef::float().indexed())
}

/// Queries never return documents of another collection, even when both
/// share field names and values.
#[tokio::test]
async fn test_collections_are_disjoint() {
    let db = catalogue().await;
    db.register(&order_model()).unwrap();
    db.insert(
        &Document::with_id("Order", "o1")
            .set("category", "electronics")
            .set("price", 999.0),
    )
    .await
    .unwrap();
    db.insert(&Document::with_id("Order", "p1").set("category", "furniture"))
        .await
        .unwrap();

    let all = db.find("Product", &Filter::new()).await.unwrap();
    assert_eq!(all.ids(), vec!["p1", "p2", "p3", "p4"]);
    assert!(all.iter().all(|d| d.collection == "Product"));

    let electronics = db
        .find("Product", &Filter::new().eq("category", "electronics"))
        .await
        .unwrap();
    assert_eq!(electronics.ids(), vec!["p1", "p2"]);
    assert!(electronics.iter().all(|d| d.collection == "Product"));

    let orders = db
        .find("Order", &Filter::new().eq("category", "electronics"))
        .await
        .unwrap();
    assert_eq!(orders.ids(), vec!["o1"]);

    // same id in both collections
    let product = db.get("Product", "p1").await.unwrap().unwrap();
    assert_eq!(product.value("category"), Some(&json!("electronics")));
    let order = db.get("Order", "p1").await.unwrap().unwrap();
    assert_eq!(order.value("category"), Some(&json!("furniture")));
}

/// The id naming the membership set is refused; the collection stays
/// queryable.
#[tokio::test]
async fn test_membership_id_refused() {
    let db = catalogue().await;

    let err = db.insert(&product("all", "books", 1.0)).await.unwrap_err();
    assert_eq!(err.code(), "KVIDX_RESERVED_DOCUMENT_ID");

    let result = db.find("Product", &Filter::new()).await.unwrap();
    assert_eq!(result.ids(), vec!["p1", "p2", "p3", "p4"]);
}

/// Refusing the reserved id on an empty collection leaves the store empty.
#[tokio::test]
async fn test_membership_id_refused_first() {
    let db = open();

    let err = db.insert(&product("all", "books", 1.0)).await.unwrap_err();
    assert_eq!(err.code(), "KVIDX_RESERVED_DOCUMENT_ID");
    assert!(db.store().keys().is_empty());

    db.insert(&product("p1", "books", 1.0)).await.unwrap();
    let result = db.find("Product", &Filter::new()).await.unwrap();
    assert_eq!(result.ids(), vec!["p1"]);
}
