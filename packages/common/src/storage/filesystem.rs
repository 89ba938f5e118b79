use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, BufReader};

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BlobStore, BoxReader, StoredBlob};

/// Filesystem-backed content-addressed blob store.
///
/// Blobs live flat under the base directory, named by their full hex hash:
/// `{base_path}/{64 hex chars}`. Writes stage into `{base_path}/.tmp` and
/// rename into place, so a partially written file is never visible under its
/// final address.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Compute the filesystem path for a given content hash.
    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.base_path.join(hash.to_hex())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, data: &[u8]) -> Result<StoredBlob, StorageError> {
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let hash = ContentHash::compute(data);
        let blob_path = self.blob_path(&hash);

        if blob_path.exists() {
            return Ok(StoredBlob { hash, size });
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredBlob { hash, size })
    }

    async fn put_stream(&self, mut reader: BoxReader) -> Result<StoredBlob, StorageError> {
        let temp_path = self.temp_path();
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            hasher.update(&buf[..n]);
            tokio::io::AsyncWriteExt::write_all(&mut temp_file, &buf[..n]).await?;
        }

        tokio::io::AsyncWriteExt::flush(&mut temp_file).await?;
        drop(temp_file);

        let hash = ContentHash::from_bytes(hasher.finalize().into());
        let blob_path = self.blob_path(&hash);

        if blob_path.exists() {
            let _ = fs::remove_file(&temp_path).await;
            return Ok(StoredBlob {
                hash,
                size: total_bytes,
            });
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredBlob {
            hash,
            size: total_bytes,
        })
    }

    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(hash);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(hash);
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(hash);
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError> {
        let blob_path = self.blob_path(hash);
        match fs::metadata(&blob_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
