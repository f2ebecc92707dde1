//! Engagement mutator: posts, comments and likes
//!
//! Counters on a post move in the same batch as the sub-collection document
//! they count, so `likesCount` and `commentsCount` always equal the number
//! of markers and comments stored under the post.

use crate::config::SocialConfig;
use crate::domain::{
    fields, Comment, CommentRecord, LikeMarker, LikeState, MediaAttachment, MediaKind, Paths,
    Post, PostDraft, PostRecord, Record, UserProfile,
};
use crate::error::{check_id, precondition_path, WriteError, WriteResult};
use crate::metrics;
use blob_store::{BlobPath, SharedBlobStore, UploadTask};
use document_store::{
    encode, Direction, FieldTransform, Fields, Query, SharedStore, StoreError, Subscription,
    WriteBatch,
};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct EngagementService {
    store: SharedStore,
    blobs: SharedBlobStore,
    config: SocialConfig,
}

impl EngagementService {
    pub fn new(store: SharedStore, blobs: SharedBlobStore, config: SocialConfig) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    // ============= Posts =============

    /// Upload media then publish the post; returns the new post id
    pub async fn create_post(&self, author_id: &str, draft: &PostDraft) -> WriteResult<String> {
        let description = draft.description.trim();
        if description.is_empty() && draft.media.is_none() {
            return Err(WriteError::InvalidInput(
                "Post needs a description or media".into(),
            ));
        }

        let media = match &draft.media {
            Some(attachment) => {
                let url = self.upload_post_media(author_id, attachment).wait().await?;
                Some((url, attachment.kind))
            }
            None => None,
        };
        self.publish_post(author_id, description, media).await
    }

    /// Start uploading to `{uid}/Post/{Images|Videos}/{uuid}`
    pub fn upload_post_media(&self, author_id: &str, media: &MediaAttachment) -> UploadTask {
        match BlobPath::post_media(author_id, media.kind) {
            Ok(path) => self.blobs.put_file(path, media.local_path.clone()),
            Err(e) => UploadTask::failed(e),
        }
    }

    /// Write the post document with denormalized author fields
    pub async fn publish_post(
        &self,
        author_id: &str,
        description: &str,
        media: Option<(String, MediaKind)>,
    ) -> WriteResult<String> {
        let author = self.author(author_id).await?;
        let (media_url, media_kind) = match media {
            Some((url, kind)) => (Some(url), Some(kind)),
            None => (None, None),
        };
        let post = Post {
            author_id: author_id.to_string(),
            author_name: author.display_name(),
            author_image_url: author.profile_image_url,
            media_url,
            media_kind,
            description: description.trim().to_string(),
            likes_count: 0,
            comments_count: 0,
            created_at: 0,
        };

        let path = Paths::posts().new_doc();
        let mut batch = WriteBatch::new();
        batch.create_with(
            path.clone(),
            encode(path.as_str(), &post)?,
            vec![FieldTransform::server_timestamp(fields::CREATED_AT)],
        );
        self.store.commit(batch).await?;

        metrics::record_engagement("post");
        info!(post_id = path.id(), author_id, "Post published");
        Ok(path.id().to_string())
    }

    pub async fn get_post(&self, post_id: &str) -> WriteResult<Option<PostRecord>> {
        check_id("Post", post_id)?;
        match self.store.get(&Paths::post(post_id)).await? {
            Some(doc) => Ok(Some(Record::from_snapshot(&doc)?)),
            None => Ok(None),
        }
    }

    // ============= Comments =============

    /// Append a comment and bump `commentsCount` atomically
    pub async fn submit_comment(
        &self,
        post_id: &str,
        text: &str,
        author_id: &str,
    ) -> WriteResult<String> {
        check_id("Post", post_id)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(WriteError::InvalidInput("Comment cannot be empty".into()));
        }
        if text.chars().count() > self.config.max_comment_length {
            return Err(WriteError::InvalidInput(format!(
                "Comment exceeds {} characters",
                self.config.max_comment_length
            )));
        }

        let author = self.author(author_id).await?;
        let comment = Comment {
            text: text.to_string(),
            author_id: author_id.to_string(),
            author_name: author.display_name(),
            created_at: 0,
        };

        let path = Paths::comments(post_id).new_doc();
        let mut batch = WriteBatch::new();
        batch
            .create_with(
                path.clone(),
                encode(path.as_str(), &comment)?,
                vec![FieldTransform::server_timestamp(fields::CREATED_AT)],
            )
            .increment(Paths::post(post_id), fields::COMMENTS_COUNT, 1);

        self.store.commit(batch).await.map_err(|e| match e {
            StoreError::NotFound(_) => WriteError::NotFound(format!("post {}", post_id)),
            other => other.into(),
        })?;

        metrics::record_engagement("comment");
        debug!(post_id, comment_id = path.id(), "Comment added");
        Ok(path.id().to_string())
    }

    /// Comments oldest first
    pub async fn comments(&self, post_id: &str) -> WriteResult<Vec<CommentRecord>> {
        check_id("Post", post_id)?;
        let docs = self.store.query(&comments_query(post_id)).await?;
        docs.iter()
            .map(|doc| Record::from_snapshot(doc).map_err(WriteError::from))
            .collect()
    }

    /// Live comment list, oldest first; decode with [`Record::from_snapshot`]
    pub async fn subscribe_comments(&self, post_id: &str) -> WriteResult<Subscription> {
        check_id("Post", post_id)?;
        Ok(self.store.subscribe(comments_query(post_id)).await?)
    }

    // ============= Likes =============

    /// Flip the caller's like on a post
    ///
    /// A concurrent toggle by the same user makes the guarded batch fail and
    /// surfaces as `WriteError::Conflict`; nothing is written in that case.
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> WriteResult<LikeState> {
        check_id("Post", post_id)?;
        check_id("User", user_id)?;
        let marker = Paths::like(post_id, user_id);
        let liked = self.store.get(&marker).await?.is_some();

        let mut batch = WriteBatch::new();
        if liked {
            batch
                .delete_existing(marker.clone())
                .increment(Paths::post(post_id), fields::LIKES_COUNT, -1);
        } else {
            let like = LikeMarker {
                user_id: user_id.to_string(),
                created_at: 0,
            };
            batch
                .create_with(
                    marker.clone(),
                    encode(marker.as_str(), &like)?,
                    vec![FieldTransform::server_timestamp(fields::CREATED_AT)],
                )
                .increment(Paths::post(post_id), fields::LIKES_COUNT, 1);
        }

        if let Err(e) = self.store.commit(batch).await {
            return Err(match precondition_path(&e) {
                Some(p) if p == marker.as_str() => {
                    warn!(post_id, user_id, "Concurrent like toggle");
                    WriteError::Conflict(format!("like state of {} changed", post_id))
                }
                Some(_) => WriteError::NotFound(format!("post {}", post_id)),
                None => e.into(),
            });
        }
        metrics::record_engagement(if liked { "unlike" } else { "like" });

        let likes_count = self
            .get_post(post_id)
            .await?
            .map(|p| p.data.likes_count)
            .unwrap_or(0);
        Ok(LikeState {
            liked: !liked,
            likes_count,
        })
    }

    pub async fn is_liked(&self, post_id: &str, user_id: &str) -> WriteResult<bool> {
        check_id("Post", post_id)?;
        if check_id("User", user_id).is_err() {
            return Ok(false);
        }
        Ok(self.store.get(&Paths::like(post_id, user_id)).await?.is_some())
    }

    /// Recompute `likesCount` and `commentsCount` from the sub-collections
    pub async fn reconcile_post_counts(&self, post_id: &str) -> WriteResult<bool> {
        check_id("Post", post_id)?;
        let post = self
            .get_post(post_id)
            .await?
            .ok_or_else(|| WriteError::NotFound(format!("post {}", post_id)))?
            .data;
        let likes = self.store.count(&Query::new(Paths::likes(post_id))).await? as u64;
        let comments = self.store.count(&Query::new(Paths::comments(post_id))).await? as u64;

        if likes == post.likes_count && comments == post.comments_count {
            return Ok(false);
        }

        warn!(
            post_id,
            stored_likes = post.likes_count,
            likes,
            stored_comments = post.comments_count,
            comments,
            "Repairing post counters"
        );
        let mut patch = Fields::new();
        patch.insert(fields::LIKES_COUNT.to_string(), likes.into());
        patch.insert(fields::COMMENTS_COUNT.to_string(), comments.into());
        self.store.update(&Paths::post(post_id), patch).await?;
        Ok(true)
    }

    async fn author(&self, uid: &str) -> WriteResult<UserProfile> {
        check_id("User", uid)?;
        let doc = self
            .store
            .get(&Paths::user(uid))
            .await?
            .ok_or_else(|| WriteError::NotFound(format!("profile {}", uid)))?;
        Ok(doc.decode()?)
    }
}

fn comments_query(post_id: &str) -> Query {
    Query::new(Paths::comments(post_id)).order_by(fields::CREATED_AT, Direction::Ascending)
}
