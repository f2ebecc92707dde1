//! Filesystem-backed blob store
//!
//! Objects are streamed chunk by chunk into a temporary sibling file and
//! renamed into place once complete, so a partial upload never becomes
//! visible under its final key.

use crate::{BlobConfig, BlobPath, BlobStore, UploadProgress, UploadTask};
use error_types::{UploadError, UploadResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct LocalBlobStore {
    config: Arc<BlobConfig>,
}

impl LocalBlobStore {
    pub fn new(config: BlobConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Where an object is stored on disk
    pub fn object_path(&self, path: &BlobPath) -> PathBuf {
        self.config.root.join(path.as_str())
    }
}

impl BlobStore for LocalBlobStore {
    fn put_file(&self, path: BlobPath, local: PathBuf) -> UploadTask {
        let (tx, rx) = watch::channel(UploadProgress::default());
        let config = self.config.clone();
        let handle = tokio::spawn(async move {
            let dest = config.root.join(path.as_str());
            let tmp = dest.with_file_name(format!(".{}.part", Uuid::new_v4().simple()));

            let result = copy_chunked(&config, &local, &dest, &tmp, &tx).await;
            match &result {
                Ok(total) => {
                    info!(key = %path, bytes = total, "Upload complete");
                }
                Err(e) => {
                    warn!(key = %path, error = %e, "Upload failed");
                    let _ = fs::remove_file(&tmp).await;
                }
            }
            result.map(|_| config.download_url(path.as_str()))
        });
        UploadTask::new(rx, handle)
    }
}

async fn copy_chunked(
    config: &BlobConfig,
    local: &Path,
    dest: &Path,
    tmp: &Path,
    tx: &watch::Sender<UploadProgress>,
) -> UploadResult<u64> {
    let mut source = File::open(local)
        .await
        .map_err(|e| UploadError::Source(format!("{}: {}", local.display(), e)))?;
    let total_bytes = source
        .metadata()
        .await
        .map_err(|e| UploadError::Source(format!("{}: {}", local.display(), e)))?
        .len();
    tx.send_replace(UploadProgress {
        bytes_transferred: 0,
        total_bytes,
    });

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| UploadError::Rejected(format!("{}: {}", parent.display(), e)))?;
    }
    let mut out = File::create(tmp)
        .await
        .map_err(|e| UploadError::Rejected(format!("{}: {}", tmp.display(), e)))?;

    let mut buf = vec![0u8; config.chunk_size.max(1)];
    let mut transferred = 0u64;
    loop {
        let n = source
            .read(&mut buf)
            .await
            .map_err(|e| UploadError::Interrupted(e.to_string()))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])
            .await
            .map_err(|e| UploadError::Interrupted(e.to_string()))?;
        transferred += n as u64;
        tx.send_replace(UploadProgress {
            bytes_transferred: transferred,
            total_bytes,
        });
        debug!(transferred, total_bytes, "Chunk written");
    }
    out.flush()
        .await
        .map_err(|e| UploadError::Interrupted(e.to_string()))?;
    drop(out);

    fs::rename(tmp, dest)
        .await
        .map_err(|e| UploadError::Rejected(format!("{}: {}", dest.display(), e)))?;
    Ok(transferred)
}
