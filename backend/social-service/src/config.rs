/// Configuration for the social components
///
/// Loads configuration from environment variables.
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Maximum hits returned by a user search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Maximum comment length in characters
    #[serde(default = "default_max_comment_length")]
    pub max_comment_length: usize,
}

// Default values
fn default_search_limit() -> usize {
    50
}

fn default_max_comment_length() -> usize {
    2000
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            max_comment_length: default_max_comment_length(),
        }
    }
}

impl SocialConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            search_limit: std::env::var("SEARCH_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_search_limit),
            max_comment_length: std::env::var("COMMENT_MAX_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_comment_length),
        };

        if config.search_limit == 0 {
            bail!("SEARCH_LIMIT must be greater than zero");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_values() {
        std::env::remove_var("SEARCH_LIMIT");
        std::env::remove_var("COMMENT_MAX_LENGTH");

        let config = SocialConfig::from_env().unwrap();

        assert_eq!(config.search_limit, 50);
        assert_eq!(config.max_comment_length, 2000);
    }

    #[test]
    #[serial]
    fn test_zero_search_limit_rejected() {
        std::env::set_var("SEARCH_LIMIT", "0");
        assert!(SocialConfig::from_env().is_err());
        std::env::remove_var("SEARCH_LIMIT");
    }
}
