//! Document store port
//!
//! The hosted document database is consumed only through [`DocumentStore`]:
//! - point reads, queries and counts over a collection
//! - live subscriptions that re-deliver the full ordered result on change
//! - atomic [`WriteBatch`] commits with existence preconditions and
//!   server-side transforms (increment, server timestamp)
//!
//! Services hold an `Arc<dyn DocumentStore>` injected at startup.
//! [`MemoryDocumentStore`] is the in-process backend used by tests and the
//! local sandbox.

mod error;
mod metrics;

pub mod batch;
pub mod memory;
pub mod path;
pub mod query;
pub mod schema;
pub mod snapshot;

pub use batch::{CommitResult, FieldTransform, Precondition, Transform, Write, WriteBatch};
pub use error::{SchemaError, StoreError, StoreResult};
pub use memory::MemoryDocumentStore;
pub use metrics::StoreMetrics;
pub use path::{validate_id, CollectionPath, DocumentPath};
pub use query::{Direction, Filter, OrderBy, Query};
pub use schema::{decode, encode, Fields};
pub use snapshot::{DocumentSnapshot, QuerySnapshot, Subscription};

use std::sync::Arc;

/// Shared handle to a document store backend
pub type SharedStore = Arc<dyn DocumentStore>;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document; `None` if absent
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>>;

    /// Run a query once
    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Subscribe to a query; the subscription starts with the current result
    async fn subscribe(&self, query: Query) -> StoreResult<Subscription>;

    /// Apply a batch atomically
    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitResult>;

    /// Number of documents matching a query
    async fn count(&self, query: &Query) -> StoreResult<usize> {
        Ok(self.query(query).await?.len())
    }

    /// Overwrite a document
    async fn set(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(path.clone(), fields);
        self.commit(batch).await.map(|_| ())
    }

    /// Merge fields into an existing document
    async fn update(&self, path: &DocumentPath, fields: Fields) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(path.clone(), fields);
        self.commit(batch).await.map(|_| ())
    }

    /// Insert under a generated id
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> StoreResult<DocumentPath> {
        let path = collection.new_doc();
        let mut batch = WriteBatch::new();
        batch.create(path.clone(), fields);
        self.commit(batch).await?;
        Ok(path)
    }

    /// Delete a document if present
    async fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(path.clone());
        self.commit(batch).await.map(|_| ())
    }
}
