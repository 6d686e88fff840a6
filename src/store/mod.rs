//! Store subsystem
//!
//! The remote key-value/data-structure service the indexes live in, seen
//! through the `KvStore` trait, plus the key layout, batch vocabulary,
//! deadlines and an in-process implementation.

mod deadline;
mod errors;
mod keys;
mod memory;
mod range;
mod traits;

pub use deadline::Deadline;
pub use errors::{StoreError, StoreResult};
pub use keys::{KeySpace, DEFAULT_INDEX_PREFIX, MEMBERSHIP_SUFFIX};
pub use memory::MemoryStore;
pub use range::{ScoreBound, ScoreRange};
pub use traits::{KvStore, StoreFuture, StoreOp};
