use blob_store::{BlobConfig, LocalBlobStore, MediaKind};
use document_store::{
    encode, CommitResult, DocumentPath, DocumentSnapshot, DocumentStore, MemoryDocumentStore,
    Query, StoreError, StoreResult, Subscription, WriteBatch,
};
use serde_json::json;
use social_service::domain::{
    LikeMarker, MediaAttachment, Paths, PostDraft, ProfileDraft, ProfileUpdate,
};
use social_service::{EngagementService, ProfileStore, SocialConfig, SocialGraph, WriteError};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    store: Arc<MemoryDocumentStore>,
    profiles: ProfileStore,
    graph: SocialGraph,
    engagement: EngagementService,
    _blobs: TempDir,
}

fn fixture() -> Fixture {
    let blobs_dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryDocumentStore::new());
    let blobs = Arc::new(LocalBlobStore::new(BlobConfig {
        root: blobs_dir.path().to_path_buf(),
        base_url: "http://blobs.test".into(),
        bucket: "sphere".into(),
        chunk_size: 64,
    }));
    let config = SocialConfig::default();
    Fixture {
        profiles: ProfileStore::new(store.clone(), blobs.clone(), config.clone()),
        graph: SocialGraph::new(store.clone()),
        engagement: EngagementService::new(store.clone(), blobs, config),
        store,
        _blobs: blobs_dir,
    }
}

fn draft(name: &str, surname: &str) -> ProfileDraft {
    ProfileDraft {
        name: name.into(),
        surname: surname.into(),
        job: "Engineer".into(),
        description: "hello".into(),
        date_of_birth: None,
    }
}

async fn seed_users(f: &Fixture) {
    f.profiles.setup_profile("a", &draft("Ana", "Lee"), None).await.unwrap();
    f.profiles.setup_profile("b", &draft("Bob", "Stone"), None).await.unwrap();
}

#[tokio::test]
async fn follow_updates_edges_and_counters() {
    let f = fixture();
    seed_users(&f).await;

    assert!(f.graph.follow("a", "b").await.unwrap());
    assert!(f.graph.is_following("a", "b").await.unwrap());
    assert!(!f.graph.is_following("b", "a").await.unwrap());

    assert_eq!(f.graph.stats("a").await.unwrap().following_count, 1);
    assert_eq!(f.graph.stats("b").await.unwrap().followers_count, 1);
    assert_eq!(f.profiles.followers("b").await.unwrap(), vec!["a"]);
    assert_eq!(f.profiles.following("a").await.unwrap(), vec!["b"]);

    assert!(f.graph.unfollow("a", "b").await.unwrap());
    assert!(!f.graph.is_following("a", "b").await.unwrap());
    assert_eq!(f.graph.stats("a").await.unwrap().following_count, 0);
    assert_eq!(f.graph.stats("b").await.unwrap().followers_count, 0);
}

#[tokio::test]
async fn follow_and_unfollow_are_idempotent() {
    let f = fixture();
    seed_users(&f).await;

    assert!(f.graph.follow("a", "b").await.unwrap());
    assert!(!f.graph.follow("a", "b").await.unwrap());
    assert_eq!(f.graph.stats("b").await.unwrap().followers_count, 1);

    assert!(f.graph.unfollow("a", "b").await.unwrap());
    assert!(!f.graph.unfollow("a", "b").await.unwrap());
    assert_eq!(f.graph.stats("b").await.unwrap().followers_count, 0);
}

#[tokio::test]
async fn follow_rejects_self_and_missing_profiles() {
    let f = fixture();
    seed_users(&f).await;

    let err = f.graph.follow("a", "a").await.unwrap_err();
    assert!(matches!(err, WriteError::InvalidInput(_)));

    let err = f.graph.follow("a", "ghost").await.unwrap_err();
    assert!(matches!(err, WriteError::NotFound(_)));
    // nothing half-written
    assert!(!f.graph.is_following("a", "ghost").await.unwrap());
    assert_eq!(f.graph.stats("a").await.unwrap().following_count, 0);
}

#[tokio::test]
async fn failed_commit_leaves_graph_untouched() {
    let f = fixture();
    seed_users(&f).await;

    f.store.fail_next_commit(StoreError::Unavailable("offline".into()));
    let err = f.graph.follow("a", "b").await.unwrap_err();
    assert!(matches!(err, WriteError::Network(_)));
    assert!(!f.graph.is_following("a", "b").await.unwrap());
    assert_eq!(f.graph.stats("b").await.unwrap().followers_count, 0);
}

#[tokio::test]
async fn reconcile_repairs_drifted_counters() {
    let f = fixture();
    seed_users(&f).await;
    f.graph.follow("a", "b").await.unwrap();
    assert!(!f.graph.reconcile_counts("b").await.unwrap());

    let mut drift = document_store::Fields::new();
    drift.insert("followersCount".into(), json!(7));
    f.store.update(&Paths::user("b"), drift).await.unwrap();

    assert!(f.graph.reconcile_counts("b").await.unwrap());
    assert_eq!(f.graph.stats("b").await.unwrap().followers_count, 1);
}

#[tokio::test]
async fn keyword_search_matches_whole_terms() {
    let f = fixture();
    seed_users(&f).await;

    for query in ["ana", "lee", "ana lee", "lee ana", "  ANA   Lee "] {
        let hits = f.profiles.search_users(query).await.unwrap();
        assert_eq!(hits.len(), 1, "query {:?}", query);
        assert_eq!(hits[0].uid, "a");
    }
    assert!(f.profiles.search_users("an").await.unwrap().is_empty());
    assert!(f.profiles.search_users("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn renaming_recomputes_keywords() {
    let f = fixture();
    seed_users(&f).await;

    let updated = f
        .profiles
        .update_profile(
            "a",
            &ProfileUpdate {
                surname: Some("Park".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.keywords, vec!["ana", "park", "ana park", "park ana"]);
    assert!(f.profiles.search_users("lee").await.unwrap().is_empty());
    assert_eq!(f.profiles.search_users("park").await.unwrap().len(), 1);

    let err = f
        .profiles
        .update_profile("ghost", &ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::NotFound(_)));
}

#[tokio::test]
async fn setup_twice_keeps_counters() {
    let f = fixture();
    seed_users(&f).await;
    f.graph.follow("b", "a").await.unwrap();

    let profile = f
        .profiles
        .setup_profile("a", &draft("Ana", "Lee-Smith"), None)
        .await
        .unwrap();
    assert_eq!(profile.followers_count, 1);
    assert_eq!(profile.surname, "Lee-Smith");
}

#[tokio::test]
async fn complete_setup_uploads_profile_image() {
    let f = fixture();
    let mut image = tempfile::NamedTempFile::new().unwrap();
    image.write_all(&[1u8; 300]).unwrap();

    let profile = f
        .profiles
        .complete_setup("a", &draft("Ana", "Lee"), Some(image.path().to_path_buf()))
        .await
        .unwrap();
    assert_eq!(
        profile.profile_image_url.as_deref(),
        Some("http://blobs.test/sphere/a/ProfileImage/profile.jpg")
    );
}

#[tokio::test]
async fn invalid_draft_is_rejected_before_upload() {
    let f = fixture();
    let err = f
        .profiles
        .complete_setup("a", &draft("", "Lee"), Some("/does/not/matter".into()))
        .await
        .unwrap_err();
    assert_eq!(err, WriteError::InvalidInput("Name is required".into()));
    assert!(f.profiles.get_profile("a").await.unwrap().is_none());
}

#[tokio::test]
async fn comments_increment_counter_in_order() {
    let f = fixture();
    seed_users(&f).await;
    let post_id = f
        .engagement
        .create_post(
            "a",
            &PostDraft {
                description: "first post".into(),
                media: None,
            },
        )
        .await
        .unwrap();

    f.engagement.submit_comment(&post_id, "one", "b").await.unwrap();
    f.engagement.submit_comment(&post_id, " two ", "a").await.unwrap();

    let comments = f.engagement.comments(&post_id).await.unwrap();
    let texts: Vec<&str> = comments.iter().map(|c| c.data.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);
    assert_eq!(comments[0].data.author_name, "Bob Stone");

    let post = f.engagement.get_post(&post_id).await.unwrap().unwrap();
    assert_eq!(post.data.comments_count, 2);
    assert_eq!(post.data.author_name, "Ana Lee");

    let err = f.engagement.submit_comment(&post_id, "   ", "a").await.unwrap_err();
    assert!(matches!(err, WriteError::InvalidInput(_)));
    let err = f.engagement.submit_comment("ghost", "hi", "a").await.unwrap_err();
    assert!(matches!(err, WriteError::NotFound(_)));
}

#[tokio::test]
async fn like_toggle_round_trip() {
    let f = fixture();
    seed_users(&f).await;
    let post_id = f
        .engagement
        .publish_post("a", "hello", None)
        .await
        .unwrap();

    let state = f.engagement.toggle_like(&post_id, "b").await.unwrap();
    assert!(state.liked);
    assert_eq!(state.likes_count, 1);
    assert!(f.engagement.is_liked(&post_id, "b").await.unwrap());

    let state = f.engagement.toggle_like(&post_id, "b").await.unwrap();
    assert!(!state.liked);
    assert_eq!(state.likes_count, 0);
    assert!(!f.engagement.is_liked(&post_id, "b").await.unwrap());
    assert!(!f.engagement.reconcile_post_counts(&post_id).await.unwrap());
}

/// Commits `marker` ahead of the first batch it forwards, as a second
/// device toggling the same like would
struct RacingStore {
    inner: Arc<MemoryDocumentStore>,
    marker: DocumentPath,
    raced: AtomicBool,
}

#[async_trait::async_trait]
impl DocumentStore for RacingStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>> {
        self.inner.get(path).await
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        self.inner.query(query).await
    }

    async fn subscribe(&self, query: Query) -> StoreResult<Subscription> {
        self.inner.subscribe(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitResult> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let like = LikeMarker {
                user_id: "b".into(),
                created_at: 0,
            };
            let mut other = WriteBatch::new();
            other.create(self.marker.clone(), encode(self.marker.as_str(), &like)?);
            self.inner.commit(other).await?;
        }
        self.inner.commit(batch).await
    }
}

#[tokio::test]
async fn racing_like_toggle_is_a_conflict() {
    let f = fixture();
    seed_users(&f).await;
    let post_id = f
        .engagement
        .publish_post("a", "hello", None)
        .await
        .unwrap();

    let racing = Arc::new(RacingStore {
        inner: f.store.clone(),
        marker: Paths::like(&post_id, "b"),
        raced: AtomicBool::new(false),
    });
    let blobs = Arc::new(LocalBlobStore::new(BlobConfig {
        root: f._blobs.path().to_path_buf(),
        base_url: "http://blobs.test".into(),
        bucket: "sphere".into(),
        chunk_size: 64,
    }));
    let engagement = EngagementService::new(racing, blobs, SocialConfig::default());

    let err = engagement.toggle_like(&post_id, "b").await.unwrap_err();
    assert!(matches!(err, WriteError::Conflict(_)));

    // the losing batch wrote nothing: the counter did not move
    let post = f.engagement.get_post(&post_id).await.unwrap().unwrap().data;
    assert_eq!(post.likes_count, 0);
    assert!(f.engagement.is_liked(&post_id, "b").await.unwrap());
}

#[tokio::test]
async fn multi_segment_ids_are_rejected() {
    let f = fixture();
    seed_users(&f).await;
    f.profiles.setup_profile("c", &draft("Cy", "Moss"), None).await.unwrap();
    assert!(f.graph.follow("b", "c").await.unwrap());

    // "b/following/c" would otherwise address b's edge document
    let err = f.graph.follow("a", "b/following/c").await.unwrap_err();
    assert!(matches!(err, WriteError::InvalidInput(_)));
    let err = f.graph.unfollow("b/following/c", "a").await.unwrap_err();
    assert!(matches!(err, WriteError::InvalidInput(_)));
    assert!(!f.graph.is_following("a", "b/following/c").await.unwrap());

    assert_eq!(f.graph.stats("a").await.unwrap().following_count, 0);
    assert_eq!(f.profiles.following("b").await.unwrap(), vec!["c"]);
    assert!(!f.graph.reconcile_counts("a").await.unwrap());

    let err = f
        .profiles
        .setup_profile("a/followers/x", &draft("Eve", "X"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::InvalidInput(_)));

    let post_id = f.engagement.publish_post("a", "hello", None).await.unwrap();
    let err = f
        .engagement
        .toggle_like(&post_id, "b/x")
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::InvalidInput(_)));
    let err = f
        .engagement
        .submit_comment(&format!("{}/comments/x", post_id), "hi", "a")
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::InvalidInput(_)));
    assert_eq!(
        f.engagement.get_post(&post_id).await.unwrap().unwrap().data.likes_count,
        0
    );
}

#[tokio::test]
async fn post_with_video_uploads_media() {
    let f = fixture();
    seed_users(&f).await;
    let mut video = tempfile::NamedTempFile::new().unwrap();
    video.write_all(&[9u8; 1000]).unwrap();

    let post_id = f
        .engagement
        .create_post(
            "a",
            &PostDraft {
                description: String::new(),
                media: Some(MediaAttachment {
                    local_path: video.path().to_path_buf(),
                    kind: MediaKind::Video,
                }),
            },
        )
        .await
        .unwrap();

    let post = f.engagement.get_post(&post_id).await.unwrap().unwrap().data;
    assert_eq!(post.media_kind, Some(MediaKind::Video));
    assert!(post
        .media_url
        .unwrap()
        .starts_with("http://blobs.test/sphere/a/Post/Videos/"));
}

#[tokio::test]
async fn schema_violation_is_reported() {
    let f = fixture();
    let raw = json!({"name": "Eve", "surname": "X", "nickname": "e"});
    f.store
        .set(&Paths::user("e"), raw.as_object().cloned().unwrap())
        .await
        .unwrap();

    let err = f.profiles.get_profile("e").await.unwrap_err();
    assert!(matches!(err, WriteError::Schema(_)));
}
