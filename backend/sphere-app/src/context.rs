//! Backend wiring
//!
//! Every component receives its backends here, once per process. Nothing
//! below this point constructs a store, blob store or identity provider on
//! its own.

use crate::config::Config;
use blob_store::{LocalBlobStore, SharedBlobStore};
use document_store::{MemoryDocumentStore, SharedStore};
use feed_service::{FeedAssembler, UserSearch};
use identity_service::{IdentityGateway, IdentityProvider, MemoryIdentityProvider, MemoryMailer};
use social_service::{EngagementService, ProfileStore, SocialGraph, WriteResult};
use std::sync::Arc;
use tracing::info;

/// The three hosted collaborators, behind their ports
#[derive(Clone)]
pub struct Backends {
    pub store: SharedStore,
    pub blobs: SharedBlobStore,
    pub identity: Arc<dyn IdentityProvider>,
}

/// In-process backends with their concrete handles kept for inspection
pub struct InMemoryBackends {
    pub documents: Arc<MemoryDocumentStore>,
    pub blobs: Arc<LocalBlobStore>,
    pub accounts: Arc<MemoryIdentityProvider>,
    pub mailer: Arc<MemoryMailer>,
}

impl InMemoryBackends {
    pub fn new(config: &Config) -> Self {
        let mailer = Arc::new(MemoryMailer::new());
        Self {
            documents: Arc::new(MemoryDocumentStore::new()),
            blobs: Arc::new(LocalBlobStore::new(config.blob.clone())),
            accounts: Arc::new(MemoryIdentityProvider::new(mailer.clone())),
            mailer,
        }
    }

    pub fn backends(&self) -> Backends {
        Backends {
            store: self.documents.clone(),
            blobs: self.blobs.clone(),
            identity: self.accounts.clone(),
        }
    }
}

/// Components shared by every screen
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub identity: IdentityGateway,
    pub profiles: ProfileStore,
    pub graph: SocialGraph,
    pub engagement: EngagementService,
    store: SharedStore,
}

impl AppContext {
    pub fn new(config: Config, backends: Backends) -> Self {
        info!(env = %config.app.env, "Wiring application context");
        Self {
            identity: IdentityGateway::new(backends.identity),
            profiles: ProfileStore::new(
                backends.store.clone(),
                backends.blobs.clone(),
                config.social.clone(),
            ),
            graph: SocialGraph::new(backends.store.clone()),
            engagement: EngagementService::new(
                backends.store.clone(),
                backends.blobs,
                config.social.clone(),
            ),
            store: backends.store,
            config,
        }
    }

    /// Start a feed for the home screen; dropping it stops the feed
    pub async fn spawn_feed(&self) -> WriteResult<FeedAssembler> {
        let search: Arc<dyn UserSearch> = Arc::new(self.profiles.clone());
        FeedAssembler::spawn(self.store.clone(), search, self.config.feed.clone()).await
    }
}
