//! Types for the relocation module.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::torrent_client::TorrentInfo;

/// Snapshot of a torrent the daemon knows about.
///
/// Fetched per request and never cached: the daemon's torrent set changes
/// continuously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentHandle {
    /// Opaque, unique identifier.
    pub hash: String,
    /// Human label, not guaranteed unique.
    pub name: String,
    /// Absolute directory where the torrent's files live.
    pub save_path: PathBuf,
}

impl TorrentHandle {
    pub fn new(
        hash: impl Into<String>,
        name: impl Into<String>,
        save_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            save_path: save_path.into(),
        }
    }
}

impl From<TorrentInfo> for TorrentHandle {
    fn from(info: TorrentInfo) -> Self {
        Self {
            hash: info.hash,
            name: info.name,
            save_path: info.save_path,
        }
    }
}

/// A request to move every file matching `pattern` into `destination_directory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationRequest {
    /// Shell-style glob matched against each file's relative name.
    pub pattern: String,
    /// Absolute directory that receives the files.
    pub destination_directory: PathBuf,
}

impl RelocationRequest {
    /// Builds a request from user text. Surrounding whitespace is dropped.
    pub fn new(pattern: impl AsRef<str>, destination_directory: impl AsRef<str>) -> Self {
        Self {
            pattern: pattern.as_ref().trim().to_string(),
            destination_directory: PathBuf::from(destination_directory.as_ref().trim()),
        }
    }
}

/// One file the executor will move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelocationPlanEntry {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    /// The file's name relative to its torrent, shown to the user.
    pub display_name: String,
}

/// A torrent whose file list could not be fetched during planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTorrent {
    pub hash: String,
    pub name: String,
    pub reason: String,
}

/// A file that could not be moved, or was refused during planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFailure {
    pub display_name: String,
    pub reason: String,
}

/// Ordered, side-effect-free description of a relocation.
///
/// Entry order follows torrents-then-files in daemon order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationPlan {
    pub destination_directory: PathBuf,
    pub entries: Vec<RelocationPlanEntry>,
    /// Matching files whose relative names were rejected as unsafe.
    pub rejected: Vec<MoveFailure>,
    pub skipped_torrents: Vec<SkippedTorrent>,
}

impl RelocationPlan {
    pub fn new(destination_directory: &Path) -> Self {
        Self {
            destination_directory: destination_directory.to_path_buf(),
            ..Default::default()
        }
    }

    /// True when no file matched (an empty plan is a valid result).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.rejected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Result of executing a plan. Produced once per execution, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationOutcome {
    pub destination_directory: PathBuf,
    /// Display names of the files now at the destination, in plan order.
    pub moved: Vec<String>,
    /// Files that were not moved, with the reason.
    pub failed: Vec<MoveFailure>,
    /// Torrents whose files could not be listed.
    pub skipped_torrents: Vec<SkippedTorrent>,
    pub bytes_moved: u64,
    pub duration_ms: u64,
}

impl RelocationOutcome {
    /// True when the plan matched nothing at all.
    pub fn is_no_match(&self) -> bool {
        self.moved.is_empty() && self.failed.is_empty()
    }

    /// True when every matched file was moved and every torrent was scanned.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped_torrents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torrent_client::TorrentState;

    #[test]
    fn test_request_trims_user_text() {
        let request = RelocationRequest::new("  *.mkv ", " /out\n");
        assert_eq!(request.pattern, "*.mkv");
        assert_eq!(request.destination_directory, PathBuf::from("/out"));
    }

    #[test]
    fn test_handle_from_torrent_info() {
        let info = TorrentInfo {
            hash: "h1".to_string(),
            name: "Movie".to_string(),
            state: TorrentState::Seeding,
            progress: 1.0,
            size_bytes: 10,
            save_path: PathBuf::from("/dl/h1"),
            added_at: None,
        };
        let handle = TorrentHandle::from(info);
        assert_eq!(handle, TorrentHandle::new("h1", "Movie", "/dl/h1"));
    }

    #[test]
    fn test_plan_emptiness() {
        let mut plan = RelocationPlan::new(Path::new("/out"));
        assert!(plan.is_empty());

        plan.rejected.push(MoveFailure {
            display_name: "../x".to_string(),
            reason: "unsafe".to_string(),
        });
        assert!(!plan.is_empty());
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn test_outcome_classification() {
        let mut outcome = RelocationOutcome::default();
        assert!(outcome.is_no_match());
        assert!(outcome.is_complete());

        outcome.moved.push("a.mkv".to_string());
        assert!(!outcome.is_no_match());

        outcome.skipped_torrents.push(SkippedTorrent {
            hash: "h".to_string(),
            name: "n".to_string(),
            reason: "r".to_string(),
        });
        assert!(!outcome.is_complete());
    }
}
