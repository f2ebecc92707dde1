/// S3 backend using multipart uploads
///
/// Each part is at least 5 MiB (the S3 minimum for all but the last part),
/// so progress is reported per part rather than per configured chunk.
use crate::{BlobConfig, BlobPath, BlobStore, UploadProgress, UploadTask};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use error_types::{UploadError, UploadResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tracing::{info, warn};

const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct S3BlobStore {
    client: Arc<Client>,
    config: Arc<BlobConfig>,
}

impl S3BlobStore {
    pub fn new(client: Arc<Client>, config: BlobConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Build a client from the ambient AWS environment
    pub async fn from_env(config: BlobConfig) -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self::new(Arc::new(Client::new(&aws_config)), config)
    }
}

impl BlobStore for S3BlobStore {
    fn put_file(&self, path: BlobPath, local: PathBuf) -> UploadTask {
        let (tx, rx) = watch::channel(UploadProgress::default());
        let client = self.client.clone();
        let config = self.config.clone();
        let handle = tokio::spawn(async move {
            match multipart_upload(&client, &config, &path, &local, &tx).await {
                Ok(total) => {
                    info!(key = %path, bytes = total, "S3 upload complete");
                    Ok(config.download_url(path.as_str()))
                }
                Err(e) => {
                    warn!(key = %path, error = %e, "S3 upload failed");
                    Err(e)
                }
            }
        });
        UploadTask::new(rx, handle)
    }
}

fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// Read until `buf` is full or the source is exhausted
async fn read_part(source: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn multipart_upload(
    client: &Client,
    config: &BlobConfig,
    path: &BlobPath,
    local: &Path,
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

    let key = path.as_str();
    let created = client
        .create_multipart_upload()
        .bucket(&config.bucket)
        .key(key)
        .content_type(content_type_for(key))
        .send()
        .await
        .map_err(|e| UploadError::Rejected(e.to_string()))?;
    let upload_id = created
        .upload_id()
        .ok_or_else(|| UploadError::Rejected("missing upload id".into()))?
        .to_string();

    let mut buf = vec![0u8; config.chunk_size.max(MIN_PART_SIZE)];
    let mut parts = Vec::new();
    let mut part_number = 1;
    let mut transferred = 0u64;

    loop {
        let n = match read_part(&mut source, &mut buf).await {
            Ok(n) => n,
            Err(e) => {
                abort(client, config, key, &upload_id).await;
                return Err(UploadError::Interrupted(e.to_string()));
            }
        };
        if n == 0 && part_number > 1 {
            break;
        }

        let uploaded = client
            .upload_part()
            .bucket(&config.bucket)
            .key(key)
            .upload_id(&upload_id)
            .part_number(part_number)
            .body(ByteStream::from(buf[..n].to_vec()))
            .send()
            .await;
        let uploaded = match uploaded {
            Ok(out) => out,
            Err(e) => {
                abort(client, config, key, &upload_id).await;
                return Err(UploadError::Interrupted(e.to_string()));
            }
        };

        parts.push(
            CompletedPart::builder()
                .set_e_tag(uploaded.e_tag().map(str::to_string))
                .part_number(part_number)
                .build(),
        );
        transferred += n as u64;
        tx.send_replace(UploadProgress {
            bytes_transferred: transferred,
            total_bytes,
        });

        if n < buf.len() {
            break;
        }
        part_number += 1;
    }

    client
        .complete_multipart_upload()
        .bucket(&config.bucket)
        .key(key)
        .upload_id(&upload_id)
        .multipart_upload(
            CompletedMultipartUpload::builder()
                .set_parts(Some(parts))
                .build(),
        )
        .send()
        .await
        .map_err(|e| UploadError::Rejected(e.to_string()))?;

    Ok(transferred)
}

async fn abort(client: &Client, config: &BlobConfig, key: &str, upload_id: &str) {
    if let Err(e) = client
        .abort_multipart_upload()
        .bucket(&config.bucket)
        .key(key)
        .upload_id(upload_id)
        .send()
        .await
    {
        warn!(key, error = %e, "Failed to abort multipart upload");
    }
}
