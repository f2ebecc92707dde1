//! Social components of the SocialSphere client core
//!
//! - [`ProfileStore`]: profile setup, edits, image upload and user search
//! - [`SocialGraph`]: follow/unfollow with mirrored edges and counters
//! - [`EngagementService`]: posts, comments and likes
//!
//! All three take their backends as injected `Arc<dyn ...>` handles.

pub mod config;
pub mod domain;
pub mod engagement;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod profiles;

pub use config::SocialConfig;
pub use engagement::EngagementService;
pub use error::{WriteError, WriteResult};
pub use graph::SocialGraph;
pub use profiles::{keywords, ProfileStore};
