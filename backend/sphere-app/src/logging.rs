/// Tracing subscriber setup
///
/// `RUST_LOG` wins when set; otherwise our crates log at `info`. Production
/// emits JSON lines, development the human-readable format.
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "sphere_app=info,identity_service=info,social_service=info,feed_service=info,\
     document_store=info,blob_store=info,warn";

pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to initialize tracing: {}", e))
}
