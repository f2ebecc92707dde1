//! Stored document types
//!
//! Wire names are camelCase. Every type rejects unknown fields so a document
//! written by a different schema version fails loudly instead of being
//! silently defaulted.

use chrono::NaiveDate;
use document_store::{DocumentSnapshot, SchemaError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

pub use blob_store::MediaKind;

pub type UserId = String;

/// `users/{uid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserProfile {
    pub name: String,
    pub surname: String,
    pub job: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    pub followers_count: u64,
    pub following_count: u64,
    pub keywords: Vec<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

/// `users/{uid}/followers/{id}` and `users/{uid}/following/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FollowEdge {
    /// The other party of the edge
    pub user_id: UserId,
    pub created_at: i64,
}

/// `posts/{postId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Post {
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
    pub description: String,
    pub likes_count: u64,
    pub comments_count: u64,
    pub created_at: i64,
}

/// `posts/{postId}/comments/{commentId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Comment {
    pub text: String,
    pub author_id: UserId,
    pub author_name: String,
    pub created_at: i64,
}

/// `posts/{postId}/likes/{uid}`; present iff the user likes the post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LikeMarker {
    pub user_id: UserId,
    pub created_at: i64,
}

/// A decoded document together with its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<T> {
    pub id: String,
    pub data: T,
}

impl<T: DeserializeOwned> Record<T> {
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Self, SchemaError> {
        Ok(Self {
            id: snapshot.id().to_string(),
            data: snapshot.decode()?,
        })
    }
}

pub type PostRecord = Record<Post>;
pub type CommentRecord = Record<Comment>;

/// Search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub uid: UserId,
    pub name: String,
    pub surname: String,
    pub job: String,
    pub profile_image_url: Option<String>,
}

impl UserSummary {
    pub fn from_profile(uid: &str, profile: UserProfile) -> Self {
        Self {
            uid: uid.to_string(),
            name: profile.name,
            surname: profile.surname,
            job: profile.job,
            profile_image_url: profile.profile_image_url,
        }
    }
}

/// First-time profile setup form
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ProfileDraft {
    #[validate(length(min = 1, max = 50, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Surname is required"))]
    pub surname: String,
    #[validate(length(max = 100))]
    pub job: String,
    #[validate(length(max = 500))]
    pub description: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl ProfileDraft {
    /// Trimmed copy; validation runs on this
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            job: self.job.trim().to_string(),
            description: self.description.trim().to_string(),
            date_of_birth: self.date_of_birth,
        }
    }
}

/// Partial profile edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub surname: Option<String>,
    #[validate(length(max = 100))]
    pub job: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub profile_image_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub fn normalized(&self) -> Self {
        let trim = |v: &Option<String>| v.as_ref().map(|s| s.trim().to_string());
        Self {
            name: trim(&self.name),
            surname: trim(&self.surname),
            job: trim(&self.job),
            description: trim(&self.description),
            profile_image_url: self.profile_image_url.clone(),
            date_of_birth: self.date_of_birth,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Editable profile fields as written by a merge
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

/// Media chosen for a new post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub local_path: PathBuf,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub description: String,
    pub media: Option<MediaAttachment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes_count: u64,
}
