//! In-process document store
//!
//! Honours the same contract as the hosted database: batches are all or
//! nothing, preconditions are checked against the batch's own staged state,
//! and every commit re-delivers full snapshots to the live subscriptions of
//! each collection it touched.

use crate::batch::{CommitResult, FieldTransform, Precondition, Transform, Write, WriteBatch};
use crate::error::{StoreError, StoreResult};
use crate::metrics::StoreMetrics;
use crate::path::{CollectionPath, DocumentPath};
use crate::query::Query;
use crate::schema::{type_name, Fields};
use crate::snapshot::{DocumentSnapshot, QuerySnapshot, Subscription};
use crate::DocumentStore;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, RwLock};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct StoredDocument {
    fields: Fields,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

struct Listener {
    query: Query,
    tx: watch::Sender<QuerySnapshot>,
}

#[derive(Default)]
struct State {
    docs: BTreeMap<DocumentPath, StoredDocument>,
    listeners: Vec<Listener>,
    last_commit: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Faults {
    offline: bool,
    fail_next_commit: Option<StoreError>,
}

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<RwLock<State>>,
    faults: Arc<Mutex<Faults>>,
    metrics: StoreMetrics,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the connection: every call fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.faults().offline = offline;
    }

    /// Make the next commit fail with `error` without applying anything
    pub fn fail_next_commit(&self, error: StoreError) {
        self.faults().fail_next_commit = Some(error);
    }

    pub async fn document_count(&self) -> usize {
        self.state.read().await.docs.len()
    }

    /// Live subscriptions whose receiver is still held
    pub async fn subscriber_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .listeners
            .iter()
            .filter(|l| l.tx.receiver_count() > 0)
            .count()
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.faults().offline {
            return Err(StoreError::Unavailable("backend unreachable".to_string()));
        }
        Ok(())
    }

    fn notify(&self, state: &mut State, touched: &HashSet<CollectionPath>, read_time: DateTime<Utc>) {
        state.listeners.retain(|l| l.tx.receiver_count() > 0);

        let State {
            docs, listeners, ..
        } = state;
        for listener in listeners.iter() {
            if touched.contains(&listener.query.collection) {
                let result = run_query(docs, &listener.query);
                listener.tx.send_replace(QuerySnapshot::new(result, read_time));
                self.metrics.record_snapshot();
            }
        }
    }
}

fn to_snapshot(path: &DocumentPath, doc: &StoredDocument) -> DocumentSnapshot {
    DocumentSnapshot {
        path: path.clone(),
        fields: doc.fields.clone(),
        create_time: doc.create_time,
        update_time: doc.update_time,
    }
}

fn run_query(docs: &BTreeMap<DocumentPath, StoredDocument>, query: &Query) -> Vec<DocumentSnapshot> {
    query.apply(
        docs.iter()
            .filter(|(path, _)| query.collection.contains(path))
            .map(|(path, doc)| to_snapshot(path, doc)),
    )
}

/// Commit times are millisecond-truncated and strictly increasing
fn next_commit_time(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    let now = DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
    match last {
        Some(last) if now <= last => last + Duration::milliseconds(1),
        _ => now,
    }
}

fn apply_transforms(
    path: &DocumentPath,
    fields: &mut Fields,
    transforms: &[FieldTransform],
    now_millis: i64,
) -> StoreResult<()> {
    for t in transforms {
        match t.transform {
            Transform::ServerTimestamp => {
                fields.insert(t.field.clone(), Value::from(now_millis));
            }
            Transform::Increment(by) => {
                let current = match fields.get(&t.field) {
                    None | Some(Value::Null) => 0,
                    Some(v) => v.as_i64().ok_or_else(|| {
                        StoreError::Rejected(format!(
                            "{}: field '{}' is a {}, not an integer",
                            path,
                            t.field,
                            type_name(v)
                        ))
                    })?,
                };
                let next = current.checked_add(by).ok_or_else(|| {
                    StoreError::Rejected(format!("{}: field '{}' overflows", path, t.field))
                })?;
                fields.insert(t.field.clone(), Value::from(next));
            }
        }
    }
    Ok(())
}

/// Validate every write against the staged state and build the result set
fn stage(
    docs: &BTreeMap<DocumentPath, StoredDocument>,
    batch: &WriteBatch,
    commit_time: DateTime<Utc>,
) -> StoreResult<HashMap<DocumentPath, Option<StoredDocument>>> {
    let millis = commit_time.timestamp_millis();
    let mut staged: HashMap<DocumentPath, Option<StoredDocument>> = HashMap::new();

    for write in batch.writes() {
        let path = write.path();
        let current = match staged.get(path) {
            Some(doc) => doc.clone(),
            None => docs.get(path).cloned(),
        };

        let next = match write {
            Write::Create {
                fields, transforms, ..
            } => {
                if current.is_some() {
                    return Err(StoreError::AlreadyExists(path.to_string()));
                }
                let mut fields = fields.clone();
                apply_transforms(path, &mut fields, transforms, millis)?;
                Some(StoredDocument {
                    fields,
                    create_time: commit_time,
                    update_time: commit_time,
                })
            }
            Write::Set {
                fields, transforms, ..
            } => {
                let create_time = current
                    .as_ref()
                    .map(|d| d.create_time)
                    .unwrap_or(commit_time);
                let mut fields = fields.clone();
                apply_transforms(path, &mut fields, transforms, millis)?;
                Some(StoredDocument {
                    fields,
                    create_time,
                    update_time: commit_time,
                })
            }
            Write::Update {
                fields, transforms, ..
            } => {
                let mut doc = current.ok_or_else(|| StoreError::NotFound(path.to_string()))?;
                for (key, value) in fields {
                    doc.fields.insert(key.clone(), value.clone());
                }
                apply_transforms(path, &mut doc.fields, transforms, millis)?;
                doc.update_time = commit_time;
                Some(doc)
            }
            Write::Delete { precondition, .. } => {
                if *precondition == Precondition::Exists && current.is_none() {
                    return Err(StoreError::NotFound(path.to_string()));
                }
                None
            }
        };
        staged.insert(path.clone(), next);
    }

    Ok(staged)
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>> {
        self.check_online()?;
        path.validate()?;
        let state = self.state.read().await;
        Ok(state.docs.get(path).map(|doc| to_snapshot(path, doc)))
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        self.check_online()?;
        query.collection.validate()?;
        let state = self.state.read().await;
        Ok(run_query(&state.docs, query))
    }

    async fn subscribe(&self, query: Query) -> StoreResult<Subscription> {
        self.check_online()?;
        query.collection.validate()?;
        let mut state = self.state.write().await;
        let initial = run_query(&state.docs, &query);
        let read_time = state.last_commit.unwrap_or_else(Utc::now);
        let (tx, rx) = watch::channel(QuerySnapshot::new(initial, read_time));
        debug!(collection = %query.collection, "Registered live subscription");
        state.listeners.push(Listener { query, tx });
        Ok(Subscription::new(rx))
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitResult> {
        self.check_online()?;
        if let Some(err) = self.faults().fail_next_commit.take() {
            self.metrics.record_commit("failed");
            warn!(error = %err, "Injected commit failure");
            return Err(err);
        }
        for write in batch.writes() {
            write.path().validate()?;
        }

        let mut state = self.state.write().await;
        let commit_time = next_commit_time(state.last_commit);

        let staged = match stage(&state.docs, &batch, commit_time) {
            Ok(staged) => staged,
            Err(err) => {
                self.metrics.record_commit("rejected");
                debug!(error = %err, writes = batch.len(), "Batch rejected");
                return Err(err);
            }
        };

        let mut touched = HashSet::new();
        for (path, doc) in staged {
            touched.insert(path.parent());
            match doc {
                Some(doc) => {
                    state.docs.insert(path, doc);
                }
                None => {
                    state.docs.remove(&path);
                }
            }
        }
        state.last_commit = Some(commit_time);

        for write in batch.writes() {
            self.metrics.record_write(write.path().as_str(), write.kind());
        }
        self.metrics.record_commit("committed");
        debug!(writes = batch.len(), "Batch committed");

        self.notify(&mut state, &touched, commit_time);

        Ok(CommitResult {
            commit_time,
            write_count: batch.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_commit_times_strictly_increase() {
        let first = next_commit_time(None);
        let second = next_commit_time(Some(first + Duration::seconds(5)));
        assert!(second > first + Duration::seconds(5));
    }

    #[test]
    fn test_increment_missing_field_starts_at_zero() {
        let path = CollectionPath::root("posts").doc("p");
        let mut raw = Fields::new();
        apply_transforms(&path, &mut raw, &[FieldTransform::increment("likesCount", 1)], 0)
            .unwrap();
        assert_eq!(raw["likesCount"], json!(1));
    }

    #[test]
    fn test_increment_rejects_non_integer() {
        let path = CollectionPath::root("posts").doc("p");
        let mut raw = fields(json!({"likesCount": "three"}));
        let err = apply_transforms(&path, &mut raw, &[FieldTransform::increment("likesCount", 1)], 0)
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[test]
    fn test_stage_sees_own_writes() {
        let path = CollectionPath::root("posts").doc("p");
        let mut batch = WriteBatch::new();
        batch
            .create(path.clone(), fields(json!({"likesCount": 0})))
            .increment(path.clone(), "likesCount", 2);
        let staged = stage(&BTreeMap::new(), &batch, Utc::now()).unwrap();
        let doc = staged[&path].as_ref().unwrap();
        assert_eq!(doc.fields["likesCount"], json!(2));
    }
}
