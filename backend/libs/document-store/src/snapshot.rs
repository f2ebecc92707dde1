//! Document snapshots and live query subscriptions

use crate::error::SchemaError;
use crate::path::DocumentPath;
use crate::schema::{decode, lookup, Fields};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// One document as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub path: DocumentPath,
    pub fields: Fields,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl DocumentSnapshot {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        lookup(&self.fields, field)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SchemaError> {
        decode(self.path.as_str(), &self.fields)
    }
}

/// Fully materialized result of a query at one point in time
///
/// Every change re-delivers the whole ordered result set; there is no diff.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub documents: Arc<Vec<DocumentSnapshot>>,
    pub read_time: Option<DateTime<Utc>>,
}

impl QuerySnapshot {
    pub fn new(documents: Vec<DocumentSnapshot>, read_time: DateTime<Utc>) -> Self {
        Self {
            documents: Arc::new(documents),
            read_time: Some(read_time),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentSnapshot> {
        self.documents.iter()
    }
}

/// Live subscription to a query
///
/// Backed by a `watch` channel: a slow reader skips intermediate snapshots
/// and only ever observes the latest one. Dropping the subscription
/// unregisters it.
pub struct Subscription {
    rx: watch::Receiver<QuerySnapshot>,
}

impl Subscription {
    pub fn new(rx: watch::Receiver<QuerySnapshot>) -> Self {
        Self { rx }
    }

    /// Latest delivered snapshot
    pub fn current(&self) -> QuerySnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot; `None` once the store side is gone
    pub async fn changed(&mut self) -> Option<QuerySnapshot> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}
