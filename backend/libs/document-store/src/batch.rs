//! Atomic multi-document write batches
//!
//! A batch either commits every write or none of them. Preconditions are
//! checked against the state the batch itself builds up, so a batch may
//! create a document and update it again in a later write.

use crate::path::DocumentPath;
use crate::schema::Fields;
use chrono::{DateTime, Utc};

/// Server-side field transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Epoch milliseconds of the commit
    ServerTimestamp,
    /// Integer add; a missing field counts as zero
    Increment(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTransform {
    pub field: String,
    pub transform: Transform,
}

impl FieldTransform {
    pub fn server_timestamp(field: &str) -> Self {
        Self {
            field: field.to_string(),
            transform: Transform::ServerTimestamp,
        }
    }

    pub fn increment(field: &str, by: i64) -> Self {
        Self {
            field: field.to_string(),
            transform: Transform::Increment(by),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    None,
    Exists,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Fails with `AlreadyExists` if the document is present
    Create {
        path: DocumentPath,
        fields: Fields,
        transforms: Vec<FieldTransform>,
    },
    /// Overwrites the whole document
    Set {
        path: DocumentPath,
        fields: Fields,
        transforms: Vec<FieldTransform>,
    },
    /// Merges top-level fields; fails with `NotFound` if absent
    Update {
        path: DocumentPath,
        fields: Fields,
        transforms: Vec<FieldTransform>,
    },
    Delete {
        path: DocumentPath,
        precondition: Precondition,
    },
}

impl Write {
    pub fn path(&self) -> &DocumentPath {
        match self {
            Write::Create { path, .. }
            | Write::Set { path, .. }
            | Write::Update { path, .. }
            | Write::Delete { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Write::Create { .. } => "create",
            Write::Set { .. } => "set",
            Write::Update { .. } => "update",
            Write::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.create_with(path, fields, Vec::new())
    }

    pub fn create_with(
        &mut self,
        path: DocumentPath,
        fields: Fields,
        transforms: Vec<FieldTransform>,
    ) -> &mut Self {
        self.writes.push(Write::Create {
            path,
            fields,
            transforms,
        });
        self
    }

    pub fn set(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.writes.push(Write::Set {
            path,
            fields,
            transforms: Vec::new(),
        });
        self
    }

    pub fn update(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.update_with(path, fields, Vec::new())
    }

    pub fn update_with(
        &mut self,
        path: DocumentPath,
        fields: Fields,
        transforms: Vec<FieldTransform>,
    ) -> &mut Self {
        self.writes.push(Write::Update {
            path,
            fields,
            transforms,
        });
        self
    }

    /// Add `by` to an integer field of an existing document
    pub fn increment(&mut self, path: DocumentPath, field: &str, by: i64) -> &mut Self {
        self.update_with(path, Fields::new(), vec![FieldTransform::increment(field, by)])
    }

    /// Delete whether or not the document exists
    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.writes.push(Write::Delete {
            path,
            precondition: Precondition::None,
        });
        self
    }

    /// Delete; fails with `NotFound` if the document is absent
    pub fn delete_existing(&mut self, path: DocumentPath) -> &mut Self {
        self.writes.push(Write::Delete {
            path,
            precondition: Precondition::Exists,
        });
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitResult {
    pub commit_time: DateTime<Utc>,
    pub write_count: usize,
}
