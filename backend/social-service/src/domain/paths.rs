//! Document path schema
//!
//! All reads and writes go through these builders so every component agrees
//! on where a document lives.

use document_store::{CollectionPath, DocumentPath};

/// Field names touched by partial writes
pub mod fields {
    pub const FOLLOWERS_COUNT: &str = "followersCount";
    pub const FOLLOWING_COUNT: &str = "followingCount";
    pub const LIKES_COUNT: &str = "likesCount";
    pub const COMMENTS_COUNT: &str = "commentsCount";
    pub const CREATED_AT: &str = "createdAt";
    pub const KEYWORDS: &str = "keywords";
}

/// Path builder
pub struct Paths;

impl Paths {
    // ============= Users =============

    /// Format: users
    pub fn users() -> CollectionPath {
        CollectionPath::root("users")
    }

    /// Format: users/{uid}
    pub fn user(uid: &str) -> DocumentPath {
        Self::users().doc(uid)
    }

    /// Format: users/{uid}/followers
    pub fn followers(uid: &str) -> CollectionPath {
        Self::user(uid).collection("followers")
    }

    /// Edge recording that `follower` follows `uid`
    /// Format: users/{uid}/followers/{follower}
    pub fn follower_edge(uid: &str, follower: &str) -> DocumentPath {
        Self::followers(uid).doc(follower)
    }

    /// Format: users/{uid}/following
    pub fn following(uid: &str) -> CollectionPath {
        Self::user(uid).collection("following")
    }

    /// Edge recording that `uid` follows `followee`
    /// Format: users/{uid}/following/{followee}
    pub fn following_edge(uid: &str, followee: &str) -> DocumentPath {
        Self::following(uid).doc(followee)
    }

    // ============= Posts =============

    /// Format: posts
    pub fn posts() -> CollectionPath {
        CollectionPath::root("posts")
    }

    /// Format: posts/{post_id}
    pub fn post(post_id: &str) -> DocumentPath {
        Self::posts().doc(post_id)
    }

    /// Format: posts/{post_id}/comments
    pub fn comments(post_id: &str) -> CollectionPath {
        Self::post(post_id).collection("comments")
    }

    /// Format: posts/{post_id}/likes
    pub fn likes(post_id: &str) -> CollectionPath {
        Self::post(post_id).collection("likes")
    }

    /// Format: posts/{post_id}/likes/{uid}
    pub fn like(post_id: &str, uid: &str) -> DocumentPath {
        Self::likes(post_id).doc(uid)
    }
}
