//! File system executor for relocation plans.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, warn};

use super::config::RelocationConfig;
use super::error::MoveError;
use super::traits::RelocationExecutor;
use super::types::RelocationPlanEntry;

/// Suffix of the temporary file a cross-volume copy is written to.
const PARTIAL_SUFFIX: &str = ".courier-partial";

/// Moves files on the local file system.
///
/// Same-volume moves are a single rename. Cross-volume moves copy into a
/// temporary file next to the destination, optionally verify it, rename it
/// into place and only then remove the source. If the source cannot be
/// removed the copy is deleted again, so a file is never lost from both sides.
///
/// Unless `overwrite_existing` is set, files are placed with a hard link
/// followed by an unlink, which fails instead of replacing a destination
/// that appeared after the up-front collision check. File systems without
/// hard links fall back to check-then-rename.
pub struct FsExecutor {
    config: RelocationConfig,
    /// Overwrites each partial copy before verification.
    #[cfg(test)]
    corrupt_partial: bool,
}

impl FsExecutor {
    /// Creates a new file system executor with the given configuration.
    pub fn new(config: RelocationConfig) -> Self {
        Self {
            config,
            #[cfg(test)]
            corrupt_partial: false,
        }
    }

    /// Creates an executor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RelocationConfig::default())
    }

    /// Attempts to move a file atomically.
    ///
    /// Returns `Ok(false)` when source and destination are on different volumes.
    async fn try_atomic_move(
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<bool, std::io::Error> {
        match place(source, destination, overwrite).await {
            Ok(()) => Ok(true),
            Err(e) if crosses_devices(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn partial_path(destination: &Path) -> PathBuf {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        destination.with_file_name(format!(".{name}{PARTIAL_SUFFIX}"))
    }

    /// Copies a file, hashing the bytes read when `calculate_checksum` is set.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        calculate_checksum: bool,
    ) -> Result<(u64, Option<String>), MoveError> {
        let source_file = File::open(source).await.map_err(|e| {
            MoveError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            MoveError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);

        let mut hasher = if calculate_checksum {
            Some(Sha256::new())
        } else {
            None
        };

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                MoveError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            if let Some(ref mut h) = hasher {
                h.update(&buffer[..bytes_read]);
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                MoveError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            MoveError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        // The copy must be durable before the source goes away.
        writer.into_inner().sync_all().await.map_err(|e| {
            MoveError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let checksum = hasher.map(|h| format!("{:x}", h.finalize()));

        Ok((total_bytes, checksum))
    }

    /// Calculates the SHA-256 checksum of a file.
    async fn calculate_checksum(&self, path: &Path) -> Result<String, MoveError> {
        let file = File::open(path)
            .await
            .map_err(|e| MoveError::ChecksumCalculationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut hasher = Sha256::new();

        loop {
            let bytes_read =
                reader
                    .read(&mut buffer)
                    .await
                    .map_err(|e| MoveError::ChecksumCalculationFailed {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Copies `source` to `partial` and checks the copy against the bytes read.
    async fn copy_verified(&self, source: &Path, partial: &Path) -> Result<u64, MoveError> {
        let (bytes, expected) = self
            .copy_file(source, partial, self.config.verify_copies)
            .await?;

        #[cfg(test)]
        {
            if self.corrupt_partial {
                let _ = fs::write(partial, b"corrupted").await;
            }
        }

        if let Some(expected) = expected {
            let actual = self.calculate_checksum(partial).await?;
            if actual != expected {
                return Err(MoveError::ChecksumMismatch {
                    path: partial.to_path_buf(),
                    expected,
                    actual,
                });
            }
        }

        if let Ok(meta) = fs::metadata(source).await {
            if let Err(e) = fs::set_permissions(partial, meta.permissions()).await {
                debug!(path = %partial.display(), error = %e, "Could not copy permissions");
            }
        }

        Ok(bytes)
    }

    /// Copy, verify, rename into place, then remove the source.
    async fn move_across_volumes(&self, source: &Path, destination: &Path) -> Result<u64, MoveError> {
        let partial = Self::partial_path(destination);

        let bytes = match self.copy_verified(source, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        if let Err(e) = place(&partial, destination, self.config.overwrite_existing).await {
            let _ = fs::remove_file(&partial).await;
            if e.kind() == ErrorKind::AlreadyExists {
                return Err(MoveError::DestinationExists {
                    path: destination.to_path_buf(),
                });
            }
            return Err(MoveError::MoveFailed {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                error: e,
            });
        }

        if let Err(e) = fs::remove_file(source).await {
            warn!(
                source = %source.display(),
                error = %e,
                "Could not remove source after copy, discarding the copy"
            );
            if let Err(undo) = fs::remove_file(destination).await {
                error!(
                    destination = %destination.display(),
                    error = %undo,
                    "Could not discard copy, file now exists in both locations"
                );
            }
            return Err(MoveError::CleanupFailed {
                path: source.to_path_buf(),
                source: e,
            });
        }

        Ok(bytes)
    }
}

async fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok()
}

fn crosses_devices(e: &std::io::Error) -> bool {
    // EXDEV is 18 on Linux and macOS
    e.kind() == ErrorKind::CrossesDevices || e.raw_os_error() == Some(18)
}

/// Moves `from` to `to` on one volume.
///
/// Without `overwrite` an existing `to` yields `AlreadyExists` and both
/// files are left untouched.
async fn place(from: &Path, to: &Path, overwrite: bool) -> std::io::Result<()> {
    if overwrite {
        return fs::rename(from, to).await;
    }

    match fs::hard_link(from, to).await {
        Ok(()) => {
            if let Err(e) = fs::remove_file(from).await {
                let _ = fs::remove_file(to).await;
                return Err(e);
            }
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists || crosses_devices(&e) => Err(e),
        Err(e) => {
            debug!(path = %to.display(), error = %e, "Hard link unavailable, renaming");
            if path_exists(to).await {
                return Err(ErrorKind::AlreadyExists.into());
            }
            fs::rename(from, to).await
        }
    }
}

#[async_trait]
impl RelocationExecutor for FsExecutor {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn move_entry(&self, entry: &RelocationPlanEntry) -> Result<u64, MoveError> {
        let source = entry.source_path.as_path();
        let destination = entry.destination_path.as_path();

        let meta = fs::metadata(source).await.map_err(|e| {
            MoveError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
        if !meta.is_file() {
            return Err(MoveError::NotAFile {
                path: source.to_path_buf(),
            });
        }

        if source == destination {
            return Err(MoveError::AlreadyInPlace {
                path: destination.to_path_buf(),
            });
        }

        if !self.config.overwrite_existing && path_exists(destination).await {
            return Err(MoveError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        if self.config.prefer_atomic_moves {
            match Self::try_atomic_move(source, destination, self.config.overwrite_existing).await {
                Ok(true) => {
                    debug!(
                        source = %source.display(),
                        destination = %destination.display(),
                        "Renamed file"
                    );
                    return Ok(meta.len());
                }
                Ok(false) => {
                    debug!(
                        source = %source.display(),
                        destination = %destination.display(),
                        "Rename crosses volumes, copying"
                    );
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    return Err(MoveError::DestinationExists {
                        path: destination.to_path_buf(),
                    });
                }
                Err(e) => {
                    return Err(MoveError::move_failed(
                        source.to_path_buf(),
                        destination.to_path_buf(),
                        e,
                    ))
                }
            }
        }

        self.move_across_volumes(source, destination).await
    }
}
