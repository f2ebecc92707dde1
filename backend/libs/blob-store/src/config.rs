/// Blob storage configuration shared by the local and S3 backends
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Directory the local backend writes objects under
    pub root: std::path::PathBuf,
    /// Public base URL download links are built from
    pub base_url: String,
    /// Bucket name
    pub bucket: String,
    /// Bytes per upload chunk; each chunk emits one progress event
    pub chunk_size: usize,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            root: "./data/blobs".into(),
            base_url: "http://localhost:9199".to_string(),
            bucket: "socialsphere".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BlobConfig {
    /// Public download URL for an object key
    pub fn download_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_path_style() {
        let config = BlobConfig {
            base_url: "https://cdn.example.com/".to_string(),
            bucket: "media".to_string(),
            ..Default::default()
        };

        let url = config.download_url("u1/ProfileImage/profile.jpg");
        assert_eq!(url, "https://cdn.example.com/media/u1/ProfileImage/profile.jpg");
    }
}
