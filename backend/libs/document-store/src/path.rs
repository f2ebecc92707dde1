//! Document and collection paths
//!
//! Paths alternate collection and document segments:
//! `users` is a collection, `users/{uid}` a document,
//! `users/{uid}/followers` a sub-collection, and so on.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

fn validate_segments(raw: &str, expect_even: bool) -> StoreResult<()> {
    if raw.is_empty() {
        return Err(StoreError::InvalidPath("empty path".to_string()));
    }
    let segments: Vec<&str> = raw.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(format!("empty segment in '{}'", raw)));
    }
    let even = segments.len() % 2 == 0;
    if even != expect_even {
        let kind = if expect_even { "document" } else { "collection" };
        return Err(StoreError::InvalidPath(format!(
            "'{}' is not a {} path",
            raw, kind
        )));
    }
    Ok(())
}

/// A document id is one non-empty segment
pub fn validate_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidPath("empty document id".to_string()));
    }
    if id.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "document id '{}' contains '/'",
            id
        )));
    }
    Ok(())
}

fn last_segment(raw: &str) -> &str {
    raw.rsplit('/').next().unwrap_or(raw)
}

/// Path of a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentPath(String);

/// Path of a collection (top-level or nested under a document)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl DocumentPath {
    pub fn parse(raw: &str) -> StoreResult<Self> {
        validate_segments(raw, true)?;
        Ok(Self(raw.to_string()))
    }

    /// Re-check the shape; ids spliced in with [`CollectionPath::doc`] are not checked, see [`validate_id`]
    pub fn validate(&self) -> StoreResult<()> {
        validate_segments(&self.0, true)
    }

    pub fn id(&self) -> &str {
        last_segment(&self.0)
    }

    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(self.0.clone()),
        }
    }

    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn parse(raw: &str) -> StoreResult<Self> {
        validate_segments(raw, false)?;
        Ok(Self(raw.to_string()))
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_segments(&self.0, false)
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id))
    }

    /// Path for a new document with a generated id
    pub fn new_doc(&self) -> DocumentPath {
        self.doc(&Uuid::new_v4().simple().to_string())
    }

    /// Collection name (last segment)
    pub fn id(&self) -> &str {
        last_segment(&self.0)
    }

    pub fn parent(&self) -> Option<DocumentPath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| DocumentPath(parent.to_string()))
    }

    /// True when `path` is a direct child document of this collection
    pub fn contains(&self, path: &DocumentPath) -> bool {
        path.parent() == *self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
