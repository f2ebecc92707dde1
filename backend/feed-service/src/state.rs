//! What the home screen shows
//!
//! Two sources feed the screen: the live post window and the user search.
//! [`FeedState::resolve`] is the single place that decides between them.

use serde::Serialize;
use social_service::domain::{PostRecord, UserSummary};

/// Progress of the current user search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    /// Normalized text of the most recent search command
    pub query: String,
    pub in_flight: bool,
    pub results: Vec<UserSummary>,
}

impl SearchState {
    pub fn is_idle(&self) -> bool {
        !self.in_flight && self.results.is_empty()
    }
}

/// Exactly one of these is rendered at a time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Loading,
    SearchResults(Vec<UserSummary>),
    Feed(Vec<PostRecord>),
    Empty,
}

impl FeedState {
    /// Precedence: a running search, then search hits, then posts
    pub fn resolve(search: &SearchState, posts: &[PostRecord]) -> Self {
        if search.in_flight {
            FeedState::Loading
        } else if !search.results.is_empty() {
            FeedState::SearchResults(search.results.clone())
        } else if !posts.is_empty() {
            FeedState::Feed(posts.to_vec())
        } else {
            FeedState::Empty
        }
    }

    pub fn kind(&self) -> FeedStateKind {
        match self {
            FeedState::Loading => FeedStateKind::Loading,
            FeedState::SearchResults(_) => FeedStateKind::SearchResults,
            FeedState::Feed(_) => FeedStateKind::Feed,
            FeedState::Empty => FeedStateKind::Empty,
        }
    }
}

/// Payload-free tag of a [`FeedState`], handy for logs and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStateKind {
    Loading,
    SearchResults,
    Feed,
    Empty,
}

/// Everything the view needs after one change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedView {
    pub state: FeedState,
    /// Inline notice, set when the last search failed
    pub notice: Option<String>,
    /// The post window is full, so older posts may exist
    pub has_more: bool,
}

impl Default for FeedView {
    fn default() -> Self {
        Self {
            state: FeedState::Empty,
            notice: None,
            has_more: false,
        }
    }
}
