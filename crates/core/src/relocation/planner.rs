//! Turns a pattern and a torrent snapshot into an ordered move plan.

use std::path::Path;

use tokio::fs;
use tracing::{debug, warn};

use super::config::RelocationConfig;
use super::error::RelocationError;
use super::matcher::PatternMatcher;
use super::resolver::resolve;
use super::traits::FileLister;
use super::types::{
    MoveFailure, RelocationPlan, RelocationPlanEntry, RelocationRequest, SkippedTorrent,
    TorrentHandle,
};

/// Builds relocation plans. Performs no filesystem mutation.
#[derive(Debug, Clone)]
pub struct RelocationPlanner {
    case_sensitive: bool,
}

impl RelocationPlanner {
    pub fn new(config: &RelocationConfig) -> Self {
        Self {
            case_sensitive: config.case_sensitive,
        }
    }

    /// Rejects requests that can never succeed.
    pub fn validate(request: &RelocationRequest) -> Result<(), RelocationError> {
        if request.pattern.is_empty() {
            return Err(RelocationError::InvalidRequest(
                "pattern must not be empty".to_string(),
            ));
        }
        if !request.destination_directory.is_absolute() {
            return Err(RelocationError::InvalidRequest(format!(
                "destination must be an absolute path: {}",
                request.destination_directory.display()
            )));
        }
        Ok(())
    }

    /// Fails with `DestinationNotFound` unless `dir` is an existing directory.
    pub async fn check_destination(dir: &Path) -> Result<(), RelocationError> {
        match fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(RelocationError::DestinationNotFound {
                path: dir.to_path_buf(),
            }),
        }
    }

    /// Plans the move of every file of `torrents` matching the request.
    ///
    /// The destination is checked before any file listing. A torrent whose
    /// files cannot be listed is recorded as skipped and the scan goes on.
    /// Matching files with unsafe names are recorded as rejected.
    pub async fn plan(
        &self,
        torrents: &[TorrentHandle],
        request: &RelocationRequest,
        lister: &dyn FileLister,
    ) -> Result<RelocationPlan, RelocationError> {
        Self::validate(request)?;
        Self::check_destination(&request.destination_directory).await?;

        let matcher = PatternMatcher::new(&request.pattern, self.case_sensitive);
        let mut plan = RelocationPlan::new(&request.destination_directory);

        for torrent in torrents {
            let files = match lister.list_torrent_files(&torrent.hash).await {
                Ok(files) => files,
                Err(e) => {
                    warn!(
                        hash = %torrent.hash,
                        name = %torrent.name,
                        error = %e,
                        "Skipping torrent, file listing failed"
                    );
                    plan.skipped_torrents.push(SkippedTorrent {
                        hash: torrent.hash.clone(),
                        name: torrent.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for file in files.iter().filter(|f| matcher.is_match(&f.name)) {
                match resolve(
                    &torrent.save_path,
                    &file.name,
                    &request.destination_directory,
                ) {
                    Ok(paths) => plan.entries.push(RelocationPlanEntry {
                        source_path: paths.source,
                        destination_path: paths.destination,
                        display_name: file.name.clone(),
                    }),
                    Err(e) => {
                        warn!(
                            hash = %torrent.hash,
                            file = %file.name,
                            error = %e,
                            "Refusing unsafe file name"
                        );
                        plan.rejected.push(MoveFailure {
                            display_name: file.name.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        debug!(
            pattern = %request.pattern,
            destination = %request.destination_directory.display(),
            entries = plan.entries.len(),
            rejected = plan.rejected.len(),
            skipped = plan.skipped_torrents.len(),
            "Relocation planned"
        );

        Ok(plan)
    }
}
