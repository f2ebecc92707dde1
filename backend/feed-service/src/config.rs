/// Configuration for the feed assembler
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Posts per window; `load_more` widens the window by this much
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    20
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Result<Self> {
        let page_size = std::env::var("FEED_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_page_size);

        if page_size == 0 {
            bail!("FEED_PAGE_SIZE must be greater than zero");
        }
        Ok(Self { page_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_page_size_default() {
        std::env::remove_var("FEED_PAGE_SIZE");
        assert_eq!(FeedConfig::from_env().unwrap().page_size, 20);
    }

    #[test]
    #[serial]
    fn test_page_size_from_env() {
        std::env::set_var("FEED_PAGE_SIZE", "5");
        assert_eq!(FeedConfig::from_env().unwrap().page_size, 5);

        std::env::set_var("FEED_PAGE_SIZE", "0");
        assert!(FeedConfig::from_env().is_err());
        std::env::remove_var("FEED_PAGE_SIZE");
    }
}
