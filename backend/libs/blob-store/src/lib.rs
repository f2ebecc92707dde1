/// Object storage port
///
/// Uploads run on a spawned task. Callers observe progress through a
/// `watch` channel and await the terminal download URL.
use error_types::{UploadError, UploadResult};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub mod config;
pub mod local;
pub mod path;
#[cfg(feature = "s3")]
pub mod s3;

pub use config::BlobConfig;
pub use local::LocalBlobStore;
pub use path::{BlobPath, MediaKind};
#[cfg(feature = "s3")]
pub use s3::S3BlobStore;

pub type SharedBlobStore = Arc<dyn BlobStore>;

pub trait BlobStore: Send + Sync {
    /// Start uploading `local` to `path`. Must be called inside a Tokio runtime.
    fn put_file(&self, path: BlobPath, local: PathBuf) -> UploadTask;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Whole percent transferred; 0 while the size is unknown
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 0;
        }
        let pct = self.bytes_transferred.saturating_mul(100) / self.total_bytes;
        pct.min(100) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.bytes_transferred >= self.total_bytes
    }
}

/// Handle to a running upload
pub struct UploadTask {
    progress: watch::Receiver<UploadProgress>,
    handle: JoinHandle<UploadResult<String>>,
}

impl UploadTask {
    pub fn new(
        progress: watch::Receiver<UploadProgress>,
        handle: JoinHandle<UploadResult<String>>,
    ) -> Self {
        Self { progress, handle }
    }

    /// An upload that fails without transferring anything
    pub fn failed(error: UploadError) -> Self {
        let (_tx, rx) = watch::channel(UploadProgress::default());
        Self::new(rx, tokio::spawn(async move { Err(error) }))
    }

    /// Progress receiver; each chunk written publishes a new value
    pub fn progress(&self) -> watch::Receiver<UploadProgress> {
        self.progress.clone()
    }

    pub fn latest(&self) -> UploadProgress {
        *self.progress.borrow()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the download URL
    pub async fn wait(self) -> UploadResult<String> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(UploadError::Interrupted("upload cancelled".into())),
            Err(e) => Err(UploadError::Interrupted(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        let p = UploadProgress {
            bytes_transferred: 512,
            total_bytes: 2048,
        };
        assert_eq!(p.percent(), 25);
        assert!(!p.is_complete());
        assert_eq!(UploadProgress::default().percent(), 0);
    }

    #[tokio::test]
    async fn test_failed_task_reports_error() {
        let task = UploadTask::failed(UploadError::Source("missing".into()));
        assert!(matches!(task.wait().await, Err(UploadError::Source(_))));
    }
}
