//! Feed assembly for the SocialSphere home screen
//!
//! - [`FeedState`]: the precedence rule between search results and posts
//! - [`FeedAssembler`]: background task merging the live post window with
//!   user search
//! - [`Composer`]: submission state for post and comment composers

pub mod assembler;
pub mod compose;
pub mod config;
pub mod state;

pub use assembler::{FeedAssembler, UserSearch};
pub use compose::{ComposeError, Composer, SubmissionState};
pub use config::FeedConfig;
pub use state::{FeedState, FeedStateKind, FeedView, SearchState};
