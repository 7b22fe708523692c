//! Error types for the relocation module.

use std::path::PathBuf;
use thiserror::Error;

use crate::torrent_client::TorrentClientError;

/// Request-level failures. Each one aborts the request before any file moves.
#[derive(Debug, Error)]
pub enum RelocationError {
    /// Destination directory is missing or not a directory.
    #[error("Destination directory not found: {path}")]
    DestinationNotFound { path: PathBuf },

    /// The torrent daemon could not be asked for its torrents.
    #[error("Torrent listing unavailable: {0}")]
    TorrentListingUnavailable(#[source] TorrentClientError),

    /// Pattern or destination unusable before any lookup happens.
    #[error("Invalid relocation request: {0}")]
    InvalidRequest(String),
}

impl RelocationError {
    /// Label used for the relocation result metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DestinationNotFound { .. } => "destination_not_found",
            Self::TorrentListingUnavailable(_) => "listing_unavailable",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Why a file's relative name cannot be turned into paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Empty file name")]
    EmptyName,

    #[error("Absolute file name not allowed: {name}")]
    AbsoluteName { name: String },

    #[error("File name escapes the torrent directory: {name}")]
    ParentTraversal { name: String },

    #[error("File name has no final component: {name}")]
    NoFileName { name: String },
}

/// Errors that can occur while moving a single planned file.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Source file not found (usually a stale daemon view).
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Source exists but is not a regular file.
    #[error("Source is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// Source and destination are the same path.
    #[error("File is already at the destination: {path}")]
    AlreadyInPlace { path: PathBuf },

    /// Destination already exists and overwrite is disabled.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// Permission denied.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to copy file across volumes.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Copy verification failed; the copy was discarded.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Failed to calculate checksum.
    #[error("Failed to calculate checksum for {path}")]
    ChecksumCalculationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source could not be removed after copying; the copy was discarded.
    #[error("Failed to remove source file after copy: {path}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MoveError {
    /// Creates a copy failed error, mapping permission errors.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied { path: destination };
        }
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error, mapping missing source and permission errors.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::SourceNotFound { path: source },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: source },
            _ => Self::MoveFailed {
                source,
                destination,
                error,
            },
        }
    }

    /// Label used for the failed files metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceNotFound { .. } => "source_not_found",
            Self::NotAFile { .. } => "not_a_file",
            Self::AlreadyInPlace { .. } => "already_in_place",
            Self::DestinationExists { .. } => "destination_exists",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::CopyFailed { .. } => "copy_failed",
            Self::MoveFailed { .. } => "move_failed",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::ChecksumCalculationFailed { .. } => "checksum_failed",
            Self::CleanupFailed { .. } => "cleanup_failed",
        }
    }

    /// Short reason shown to the user next to the file name.
    pub fn reason(&self) -> String {
        match self {
            Self::CopyFailed { error, .. } | Self::MoveFailed { error, .. } => {
                format!("{self} ({error})")
            }
            Self::CleanupFailed { source, .. } | Self::ChecksumCalculationFailed { source, .. } => {
                format!("{self} ({source})")
            }
            _ => self.to_string(),
        }
    }
}
