//! Social graph mutator
//!
//! A follow relationship is stored twice, once under each party, and both
//! profiles carry a counter. Every mutation writes both edges and both
//! counters in one batch so the four documents never disagree.

use crate::domain::{fields, FollowEdge, GraphStats, Paths};
use crate::error::{check_id, precondition_path, WriteError, WriteResult};
use crate::metrics;
use document_store::{
    encode, DocumentPath, FieldTransform, Fields, Query, SharedStore, StoreError, WriteBatch,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct SocialGraph {
    store: SharedStore,
}

fn edge_fields(path: &DocumentPath, other: &str) -> WriteResult<Fields> {
    let edge = FollowEdge {
        user_id: other.to_string(),
        created_at: 0,
    };
    Ok(encode(path.as_str(), &edge)?)
}

fn check_pair(follower: &str, followee: &str) -> WriteResult<()> {
    check_id("User", follower)?;
    check_id("User", followee)?;
    if follower == followee {
        return Err(WriteError::InvalidInput("Cannot follow self".into()));
    }
    Ok(())
}

impl SocialGraph {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Follow `followee`; `Ok(false)` if the edge already existed
    pub async fn follow(&self, follower: &str, followee: &str) -> WriteResult<bool> {
        check_pair(follower, followee)?;
        let inbound = Paths::follower_edge(followee, follower);
        let outbound = Paths::following_edge(follower, followee);

        let mut batch = WriteBatch::new();
        batch
            .create_with(
                inbound.clone(),
                edge_fields(&inbound, follower)?,
                vec![FieldTransform::server_timestamp(fields::CREATED_AT)],
            )
            .create_with(
                outbound.clone(),
                edge_fields(&outbound, followee)?,
                vec![FieldTransform::server_timestamp(fields::CREATED_AT)],
            )
            .increment(Paths::user(follower), fields::FOLLOWING_COUNT, 1)
            .increment(Paths::user(followee), fields::FOLLOWERS_COUNT, 1);

        match self.store.commit(batch).await {
            Ok(_) => {
                metrics::record_graph("follow", "applied");
                info!(follower, followee, "Followed");
                Ok(true)
            }
            Err(StoreError::AlreadyExists(_)) => {
                metrics::record_graph("follow", "noop");
                Ok(false)
            }
            Err(e) => {
                metrics::record_graph("follow", "failed");
                Err(profile_error(e))
            }
        }
    }

    /// Unfollow `followee`; `Ok(false)` if there was no edge
    pub async fn unfollow(&self, follower: &str, followee: &str) -> WriteResult<bool> {
        check_pair(follower, followee)?;
        let inbound = Paths::follower_edge(followee, follower);
        let outbound = Paths::following_edge(follower, followee);

        let mut batch = WriteBatch::new();
        batch
            .delete_existing(inbound.clone())
            .delete_existing(outbound.clone())
            .increment(Paths::user(follower), fields::FOLLOWING_COUNT, -1)
            .increment(Paths::user(followee), fields::FOLLOWERS_COUNT, -1);

        match self.store.commit(batch).await {
            Ok(_) => {
                metrics::record_graph("unfollow", "applied");
                info!(follower, followee, "Unfollowed");
                Ok(true)
            }
            Err(e)
                if precondition_path(&e)
                    .is_some_and(|p| p == inbound.as_str() || p == outbound.as_str()) =>
            {
                metrics::record_graph("unfollow", "noop");
                Ok(false)
            }
            Err(e) => {
                metrics::record_graph("unfollow", "failed");
                Err(profile_error(e))
            }
        }
    }

    pub async fn is_following(&self, follower: &str, followee: &str) -> WriteResult<bool> {
        if check_id("User", follower).is_err() || check_id("User", followee).is_err() {
            return Ok(false);
        }
        let edge = self
            .store
            .get(&Paths::following_edge(follower, followee))
            .await?;
        Ok(edge.is_some())
    }

    pub async fn stats(&self, uid: &str) -> WriteResult<GraphStats> {
        let (followers_count, following_count) = self.stored_counts(uid).await?;
        Ok(GraphStats {
            followers_count,
            following_count,
        })
    }

    /// Recompute both counters from the edge collections
    ///
    /// Returns `true` if the stored counters had drifted and were repaired.
    pub async fn reconcile_counts(&self, uid: &str) -> WriteResult<bool> {
        check_id("User", uid)?;
        let followers = self.store.count(&Query::new(Paths::followers(uid))).await? as u64;
        let following = self.store.count(&Query::new(Paths::following(uid))).await? as u64;
        let (stored_followers, stored_following) = self.stored_counts(uid).await?;

        if followers == stored_followers && following == stored_following {
            return Ok(false);
        }

        warn!(
            uid,
            stored_followers, followers, stored_following, following, "Repairing follow counters"
        );
        let mut patch = Fields::new();
        patch.insert(fields::FOLLOWERS_COUNT.to_string(), followers.into());
        patch.insert(fields::FOLLOWING_COUNT.to_string(), following.into());
        self.store.update(&Paths::user(uid), patch).await?;
        Ok(true)
    }

    async fn stored_counts(&self, uid: &str) -> WriteResult<(u64, u64)> {
        check_id("User", uid)?;
        let doc = self
            .store
            .get(&Paths::user(uid))
            .await?
            .ok_or_else(|| WriteError::NotFound(format!("profile {}", uid)))?;
        let count = |field: &str| -> WriteResult<u64> {
            doc.get(field).and_then(|v| v.as_u64()).ok_or_else(|| {
                WriteError::Schema(format!("{}: {} is not a counter", doc.path, field))
            })
        };
        Ok((count(fields::FOLLOWERS_COUNT)?, count(fields::FOLLOWING_COUNT)?))
    }
}

/// A missing profile surfaces as `NotFound` naming the document
fn profile_error(err: StoreError) -> WriteError {
    match err {
        StoreError::NotFound(path) => WriteError::NotFound(format!("profile {}", path)),
        other => other.into(),
    }
}
