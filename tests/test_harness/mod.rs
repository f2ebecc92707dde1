//! Test Harness Module
//!
//! Builds a complete application context over the in-process backends:
//! - memory document store and identity provider
//! - filesystem blob store rooted in a temporary directory
//! - helpers to onboard users and wait on feed views

#![allow(dead_code)]

use socialsphere::blob_store::BlobConfig;
use socialsphere::feed_service::{FeedAssembler, FeedConfig, FeedView};
use socialsphere::identity_service::MailKind;
use socialsphere::social_service::domain::ProfileDraft;
use socialsphere::social_service::SocialConfig;
use socialsphere::sphere_app::config::AppConfig;
use socialsphere::{AppContext, Config, InMemoryBackends};
use std::time::Duration;
use tempfile::TempDir;

/// Test Environment
pub struct TestEnvironment {
    pub ctx: AppContext,
    pub backends: InMemoryBackends,
    _blobs: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_page_size(20)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        let blobs = TempDir::new().expect("Failed to create blob dir");
        let config = Config {
            app: AppConfig {
                env: "test".to_string(),
            },
            blob: BlobConfig {
                root: blobs.path().to_path_buf(),
                base_url: "http://blobs.test".to_string(),
                bucket: "sphere".to_string(),
                chunk_size: 128,
            },
            social: SocialConfig::default(),
            feed: FeedConfig { page_size },
        };
        let backends = InMemoryBackends::new(&config);
        let ctx = AppContext::new(config, backends.backends());
        Self {
            ctx,
            backends,
            _blobs: blobs,
        }
    }

    /// Register, verify, sign in and set up a profile; returns the uid
    pub async fn onboard(&self, email: &str, name: &str, surname: &str) -> String {
        self.ctx
            .identity
            .register(email, "secret1")
            .await
            .expect("register failed");
        let token = self
            .backends
            .mailer
            .last_token(MailKind::Verification, email)
            .expect("no verification mail");
        self.backends
            .accounts
            .verify_email(&token)
            .expect("verification failed");
        let user = self
            .ctx
            .identity
            .sign_in(email, "secret1")
            .await
            .expect("sign in failed");

        let draft = ProfileDraft {
            name: name.to_string(),
            surname: surname.to_string(),
            job: "Tester".to_string(),
            description: String::new(),
            date_of_birth: None,
        };
        self.ctx
            .profiles
            .setup_profile(&user.uid, &draft, None)
            .await
            .expect("profile setup failed");
        user.uid
    }
}

/// Wait until the feed view satisfies `pred`
pub async fn wait_for_view(
    feed: &FeedAssembler,
    pred: impl FnMut(&FeedView) -> bool,
) -> FeedView {
    let mut rx = feed.watch();
    let result = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("feed view did not reach the expected state");
    let view = result.expect("feed assembler stopped").clone();
    view
}
