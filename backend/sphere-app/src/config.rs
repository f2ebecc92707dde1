//! Process configuration
//!
//! Loaded once at startup from the environment (and `.env` in debug builds).
//!
//! | Variable | Default |
//! |---|---|
//! | `APP_ENV` | `development` |
//! | `BLOB_ROOT` | `./data/blobs` |
//! | `BLOB_BASE_URL` | `http://localhost:9199` |
//! | `BLOB_BUCKET` | `socialsphere` |
//! | `UPLOAD_CHUNK_SIZE` | 262144 |
//! | `FEED_PAGE_SIZE` | 20 |
//! | `SEARCH_LIMIT` | 50 |
//! | `COMMENT_MAX_LENGTH` | 2000 |

use anyhow::{bail, Context, Result};
use blob_store::BlobConfig;
use feed_service::FeedConfig;
use serde::{Deserialize, Serialize};
use social_service::SocialConfig;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub blob: BlobConfig,
    pub social: SocialConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        Ok(Self {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            },
            blob: blob_config_from_env()?,
            social: SocialConfig::from_env().context("Invalid social configuration")?,
            feed: FeedConfig::from_env().context("Invalid feed configuration")?,
        })
    }
}

fn blob_config_from_env() -> Result<BlobConfig> {
    let defaults = BlobConfig::default();

    let chunk_size = match env::var("UPLOAD_CHUNK_SIZE") {
        Ok(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("UPLOAD_CHUNK_SIZE is not a number: {}", raw))?,
        Err(_) => defaults.chunk_size,
    };
    if chunk_size == 0 {
        bail!("UPLOAD_CHUNK_SIZE must be greater than zero");
    }

    Ok(BlobConfig {
        root: env::var("BLOB_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.root),
        base_url: env::var("BLOB_BASE_URL").unwrap_or(defaults.base_url),
        bucket: env::var("BLOB_BUCKET").unwrap_or(defaults.bucket),
        chunk_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "APP_ENV",
        "BLOB_ROOT",
        "BLOB_BASE_URL",
        "BLOB_BUCKET",
        "UPLOAD_CHUNK_SIZE",
        "FEED_PAGE_SIZE",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = Config::from_env().unwrap();
        assert_eq!(config.app.env, "development");
        assert!(!config.app.is_production());
        assert_eq!(config.blob.root, PathBuf::from("./data/blobs"));
        assert_eq!(config.blob.chunk_size, 256 * 1024);
        assert_eq!(config.feed.page_size, 20);
        assert_eq!(config.social.search_limit, 50);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        env::set_var("APP_ENV", "Production");
        env::set_var("BLOB_BUCKET", "media");
        env::set_var("UPLOAD_CHUNK_SIZE", "1024");
        env::set_var("FEED_PAGE_SIZE", "5");

        let config = Config::from_env().unwrap();
        assert!(config.app.is_production());
        assert_eq!(config.blob.bucket, "media");
        assert_eq!(config.blob.chunk_size, 1024);
        assert_eq!(config.feed.page_size, 5);
        clear();
    }

    #[test]
    #[serial]
    fn test_bad_chunk_size() {
        clear();
        env::set_var("UPLOAD_CHUNK_SIZE", "lots");
        assert!(Config::from_env().is_err());
        env::set_var("UPLOAD_CHUNK_SIZE", "0");
        assert!(Config::from_env().is_err());
        clear();
    }
}
