//! Object store seam.

use crate::error::StoreResult;
use crate::BoxFuture;
use std::sync::Arc;

/// Whole-object download and upload against a bucketed object store.
///
/// `get` drives the daily batch fetch; `put` serves upload paths outside
/// the drain (source refresh), never the core write loop.
pub trait ObjectStore: Send + Sync {
    /// Download an object in full.
    fn get(&self, bucket: &str, key: &str) -> BoxFuture<'_, StoreResult<Vec<u8>>>;

    /// Upload an object, replacing any previous body.
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> BoxFuture<'_, StoreResult<()>>;
}

/// Arc wrapper for ObjectStore trait objects.
pub type DynObjectStore = Arc<dyn ObjectStore>;
