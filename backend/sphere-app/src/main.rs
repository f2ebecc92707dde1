/// SocialSphere local sandbox
///
/// Wires the in-process backends and walks two users through onboarding,
/// a follow, a post with a comment and a like, then opens the feed and runs
/// a user search. Blobs land under `BLOB_ROOT`.
use anyhow::{anyhow, Context, Result};
use feed_service::{Composer, FeedStateKind};
use identity_service::MailKind;
use prometheus::{Encoder, TextEncoder};
use social_service::domain::ProfileDraft;
use sphere_app::{initial_route, logging, AppContext, Config, InMemoryBackends, Route};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    logging::init_tracing(config.app.is_production())?;
    info!(env = %config.app.env, "Starting SocialSphere sandbox");

    let registry = sphere_app::metrics_registry().context("Failed to register metrics")?;
    let sandbox = InMemoryBackends::new(&config);
    let ctx = AppContext::new(config, sandbox.backends());

    let ana = onboard(&ctx, &sandbox, "ana@example.com", "Ana", "Lee").await?;
    let bob = onboard(&ctx, &sandbox, "bob@example.com", "Bob", "Stone").await?;

    ctx.graph.follow(&bob, &ana).await?;
    let stats = ctx.graph.stats(&ana).await?;
    info!(uid = %ana, followers = stats.followers_count, "Follow applied");

    let composer = Composer::new();
    let post_id = composer
        .submit(ctx.engagement.publish_post(&ana, "Hello from the sandbox", None))
        .await?;
    composer
        .submit(ctx.engagement.submit_comment(&post_id, "Welcome!", &bob))
        .await?;
    let like = ctx.engagement.toggle_like(&post_id, &bob).await?;
    info!(post_id = %post_id, likes = like.likes_count, "Engagement recorded");

    let feed = ctx.spawn_feed().await?;
    info!(state = ?feed.view().state.kind(), "Feed opened");

    feed.search("ana");
    let mut view = feed.watch();
    let found = tokio::time::timeout(
        Duration::from_secs(5),
        view.wait_for(|v| v.state.kind() == FeedStateKind::SearchResults || v.notice.is_some()),
    )
    .await
    .context("Search did not finish")?
    .map_err(|_| anyhow!("Feed stopped before the search finished"))?
    .clone();
    info!(state = ?found.state.kind(), notice = ?found.notice, "Search finished");

    drop(feed);
    ctx.identity.sign_out().await?;

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    println!("{}", String::from_utf8_lossy(&buffer));

    info!("Sandbox finished");
    Ok(())
}

/// Register, verify, sign in and set up a profile; returns the uid
async fn onboard(
    ctx: &AppContext,
    sandbox: &InMemoryBackends,
    email: &str,
    name: &str,
    surname: &str,
) -> Result<String> {
    ctx.identity.register(email, "secret1").await?;
    let token = sandbox
        .mailer
        .last_token(MailKind::Verification, email)
        .ok_or_else(|| anyhow!("No verification mail for {}", email))?;
    sandbox.accounts.verify_email(&token)?;

    let user = ctx.identity.sign_in(email, "secret1").await?;
    if initial_route(&ctx.identity, &ctx.profiles).await? != (Route::ProfileSetup { uid: user.uid.clone() }) {
        return Err(anyhow!("{} should start at profile setup", email));
    }

    let draft = ProfileDraft {
        name: name.to_string(),
        surname: surname.to_string(),
        job: "Sandbox tester".to_string(),
        description: String::new(),
        date_of_birth: None,
    };
    ctx.profiles.setup_profile(&user.uid, &draft, None).await?;

    let route = initial_route(&ctx.identity, &ctx.profiles).await?;
    info!(email, ?route, "User onboarded");
    Ok(user.uid)
}
