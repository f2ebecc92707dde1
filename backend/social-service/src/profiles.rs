//! Profile store
//!
//! Owns `users/{uid}`: first-time setup, partial edits, the profile image
//! and the keyword set that user search matches against.

use crate::config::SocialConfig;
use crate::domain::{
    fields, FollowEdge, Paths, ProfileDraft, ProfilePatch, ProfileUpdate, UserId, UserProfile,
    UserSummary,
};
use crate::error::{check_id, invalid, WriteError, WriteResult};
use blob_store::{BlobPath, SharedBlobStore, UploadTask};
use document_store::{encode, CollectionPath, Direction, Query, SharedStore, StoreError, WriteBatch};
use std::path::PathBuf;
use tracing::{debug, info};
use validator::Validate;

/// Lower-case and collapse internal whitespace
pub fn normalize_term(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Search terms for a name: first, last, "first last", "last first"
pub fn keywords(name: &str, surname: &str) -> Vec<String> {
    let first = normalize_term(name);
    let last = normalize_term(surname);
    let candidates = [
        first.clone(),
        last.clone(),
        format!("{} {}", first, last),
        format!("{} {}", last, first),
    ];

    let mut out: Vec<String> = Vec::with_capacity(candidates.len());
    for term in candidates {
        let term = term.trim().to_string();
        if !term.is_empty() && !out.contains(&term) {
            out.push(term);
        }
    }
    out
}

#[derive(Clone)]
pub struct ProfileStore {
    store: SharedStore,
    blobs: SharedBlobStore,
    config: SocialConfig,
}

impl ProfileStore {
    pub fn new(store: SharedStore, blobs: SharedBlobStore, config: SocialConfig) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    /// Create the profile, or update its editable fields if it already exists
    pub async fn setup_profile(
        &self,
        uid: &str,
        draft: &ProfileDraft,
        image_url: Option<String>,
    ) -> WriteResult<UserProfile> {
        check_id("User", uid)?;
        let draft = draft.normalized();
        draft.validate().map_err(invalid)?;
        let path = Paths::user(uid);

        let profile = UserProfile {
            name: draft.name.clone(),
            surname: draft.surname.clone(),
            job: draft.job.clone(),
            description: draft.description.clone(),
            profile_image_url: image_url.clone(),
            date_of_birth: draft.date_of_birth,
            followers_count: 0,
            following_count: 0,
            keywords: keywords(&draft.name, &draft.surname),
        };

        let mut batch = WriteBatch::new();
        batch.create(path.clone(), encode(path.as_str(), &profile)?);
        match self.store.commit(batch).await {
            Ok(_) => {
                info!(uid, "Profile created");
                return Ok(profile);
            }
            Err(StoreError::AlreadyExists(_)) => {
                debug!(uid, "Profile exists, merging setup fields");
            }
            Err(e) => return Err(e.into()),
        }

        let patch = ProfilePatch {
            name: Some(draft.name.clone()),
            surname: Some(draft.surname.clone()),
            job: Some(draft.job.clone()),
            description: Some(draft.description.clone()),
            profile_image_url: image_url,
            date_of_birth: draft.date_of_birth,
            keywords: Some(profile.keywords),
        };
        self.merge(uid, &patch).await
    }

    /// Upload the optional image, then run [`Self::setup_profile`] with its URL
    pub async fn complete_setup(
        &self,
        uid: &str,
        draft: &ProfileDraft,
        image: Option<PathBuf>,
    ) -> WriteResult<UserProfile> {
        check_id("User", uid)?;
        draft.normalized().validate().map_err(invalid)?;

        let image_url = match image {
            Some(local) => Some(self.upload_profile_image(uid, local).wait().await?),
            None => None,
        };
        self.setup_profile(uid, draft, image_url).await
    }

    /// Upload to `{uid}/ProfileImage/profile.jpg`, replacing any previous image
    pub fn upload_profile_image(&self, uid: &str, local: PathBuf) -> UploadTask {
        match BlobPath::profile_image(uid) {
            Ok(path) => self.blobs.put_file(path, local),
            Err(e) => UploadTask::failed(e),
        }
    }

    pub async fn get_profile(&self, uid: &str) -> WriteResult<Option<UserProfile>> {
        check_id("User", uid)?;
        let snapshot = self.store.get(&Paths::user(uid)).await?;
        match snapshot {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Merge the provided fields; keywords follow name changes
    pub async fn update_profile(
        &self,
        uid: &str,
        update: &ProfileUpdate,
    ) -> WriteResult<UserProfile> {
        let update = update.normalized();
        update.validate().map_err(invalid)?;

        let current = self
            .get_profile(uid)
            .await?
            .ok_or_else(|| WriteError::NotFound(format!("profile {}", uid)))?;
        if update.is_empty() {
            return Ok(current);
        }

        let keywords = if update.name.is_some() || update.surname.is_some() {
            let name = update.name.as_deref().unwrap_or(&current.name);
            let surname = update.surname.as_deref().unwrap_or(&current.surname);
            Some(keywords(name, surname))
        } else {
            None
        };

        let patch = ProfilePatch {
            name: update.name,
            surname: update.surname,
            job: update.job,
            description: update.description,
            profile_image_url: update.profile_image_url,
            date_of_birth: update.date_of_birth,
            keywords,
        };
        self.merge(uid, &patch).await
    }

    pub async fn followers(&self, uid: &str) -> WriteResult<Vec<UserId>> {
        check_id("User", uid)?;
        self.edge_ids(Paths::followers(uid)).await
    }

    pub async fn following(&self, uid: &str) -> WriteResult<Vec<UserId>> {
        check_id("User", uid)?;
        self.edge_ids(Paths::following(uid)).await
    }

    /// Exact keyword match; an empty query matches nothing
    pub async fn search_users(&self, query: &str) -> WriteResult<Vec<UserSummary>> {
        let term = normalize_term(query);
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new(Paths::users())
            .where_array_contains(fields::KEYWORDS, term.as_str())
            .limit(self.config.search_limit);
        let docs = self.store.query(&query).await?;

        let mut hits = Vec::with_capacity(docs.len());
        for doc in &docs {
            let profile: UserProfile = doc.decode()?;
            hits.push(UserSummary::from_profile(doc.id(), profile));
        }
        debug!(term = %term, hits = hits.len(), "User search");
        Ok(hits)
    }

    async fn merge(&self, uid: &str, patch: &ProfilePatch) -> WriteResult<UserProfile> {
        let path = Paths::user(uid);
        self.store
            .update(&path, encode(path.as_str(), patch)?)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => WriteError::NotFound(format!("profile {}", uid)),
                other => other.into(),
            })?;
        info!(uid, "Profile updated");

        self.get_profile(uid)
            .await?
            .ok_or_else(|| WriteError::NotFound(format!("profile {}", uid)))
    }

    async fn edge_ids(&self, collection: CollectionPath) -> WriteResult<Vec<UserId>> {
        let query = Query::new(collection).order_by(fields::CREATED_AT, Direction::Ascending);
        let docs = self.store.query(&query).await?;
        let mut ids = Vec::with_capacity(docs.len());
        for doc in &docs {
            let edge: FollowEdge = doc.decode()?;
            ids.push(edge.user_id);
        }
        Ok(ids)
    }
}
