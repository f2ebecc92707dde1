//! Object keys
//!
//! Media lives under the owning user's id:
//! - `{uid}/ProfileImage/profile.jpg`, overwritten on every change
//! - `{uid}/Post/Images/{uuid}` and `{uid}/Post/Videos/{uuid}`

use error_types::{UploadError, UploadResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn folder(self) -> &'static str {
        match self {
            MediaKind::Image => "Images",
            MediaKind::Video => "Videos",
        }
    }
}

/// The owner id must be exactly the first key segment
fn check_owner(uid: &str) -> UploadResult<()> {
    if uid.is_empty() || uid.contains('/') {
        return Err(UploadError::Rejected(format!("invalid owner id '{}'", uid)));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath(String);

impl BlobPath {
    pub fn parse(raw: &str) -> UploadResult<Self> {
        let valid = !raw.is_empty()
            && raw
                .split('/')
                .all(|s| !s.is_empty() && s != "." && s != "..");
        if !valid {
            return Err(UploadError::Rejected(format!("invalid object key '{}'", raw)));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn profile_image(uid: &str) -> UploadResult<Self> {
        check_owner(uid)?;
        Self::parse(&format!("{}/ProfileImage/profile.jpg", uid))
    }

    /// Fresh key for a post attachment
    pub fn post_media(uid: &str, kind: MediaKind) -> UploadResult<Self> {
        check_owner(uid)?;
        Self::parse(&format!(
            "{}/Post/{}/{}",
            uid,
            kind.folder(),
            Uuid::new_v4()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
