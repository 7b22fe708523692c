//! Planner and executor pipeline shared by inline and interactive moves.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use super::config::RelocationConfig;
use super::error::RelocationError;
use super::executor::FsExecutor;
use super::planner::RelocationPlanner;
use super::traits::{FileLister, RelocationExecutor, TorrentDirectory};
use super::types::{RelocationOutcome, RelocationRequest};
use crate::metrics::{RELOCATIONS_TOTAL, RELOCATION_DURATION};
use crate::torrent_client::TorrentClient;

/// How a relocation request reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationMode {
    Inline,
    Interactive,
}

impl RelocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelocationMode::Inline => "inline",
            RelocationMode::Interactive => "interactive",
        }
    }
}

/// Runs validation, planning and execution for one request.
pub struct RelocationService {
    directory: Arc<dyn TorrentDirectory>,
    lister: Arc<dyn FileLister>,
    executor: Arc<dyn RelocationExecutor>,
    planner: RelocationPlanner,
}

impl RelocationService {
    pub fn new(
        directory: Arc<dyn TorrentDirectory>,
        lister: Arc<dyn FileLister>,
        executor: Arc<dyn RelocationExecutor>,
        config: &RelocationConfig,
    ) -> Self {
        Self {
            directory,
            lister,
            executor,
            planner: RelocationPlanner::new(config),
        }
    }

    /// Uses `client` for both torrent and file listings and moves files
    /// on the local file system.
    pub fn from_client<C>(client: Arc<C>, config: RelocationConfig) -> Self
    where
        C: TorrentClient + 'static,
    {
        let planner = RelocationPlanner::new(&config);
        Self {
            directory: client.clone(),
            lister: client,
            executor: Arc::new(FsExecutor::new(config)),
            planner,
        }
    }

    /// Single-shot relocation with both values supplied by the caller.
    pub async fn move_inline(
        &self,
        request: &RelocationRequest,
    ) -> Result<RelocationOutcome, RelocationError> {
        self.relocate(request, RelocationMode::Inline).await
    }

    /// Validates, checks the destination, snapshots the torrents, plans and
    /// executes. Request-level errors leave the filesystem untouched.
    pub async fn relocate(
        &self,
        request: &RelocationRequest,
        mode: RelocationMode,
    ) -> Result<RelocationOutcome, RelocationError> {
        let started = Instant::now();
        let result = self.run(request).await;
        let elapsed = started.elapsed();

        RELOCATION_DURATION
            .with_label_values(&[mode.as_str()])
            .observe(elapsed.as_secs_f64());

        match result {
            Ok(mut outcome) => {
                outcome.duration_ms = elapsed.as_millis() as u64;
                let label = if outcome.is_no_match() {
                    "no_matches"
                } else if outcome.is_complete() {
                    "completed"
                } else {
                    "partial"
                };
                RELOCATIONS_TOTAL.with_label_values(&[label]).inc();
                info!(
                    mode = mode.as_str(),
                    executor = self.executor.name(),
                    pattern = %request.pattern,
                    destination = %request.destination_directory.display(),
                    moved = outcome.moved.len(),
                    failed = outcome.failed.len(),
                    skipped = outcome.skipped_torrents.len(),
                    bytes = outcome.bytes_moved,
                    duration_ms = outcome.duration_ms,
                    "Relocation finished"
                );
                Ok(outcome)
            }
            Err(e) => {
                RELOCATIONS_TOTAL.with_label_values(&[e.kind()]).inc();
                warn!(
                    mode = mode.as_str(),
                    executor = self.executor.name(),
                    pattern = %request.pattern,
                    destination = %request.destination_directory.display(),
                    error = %e,
                    "Relocation aborted"
                );
                Err(e)
            }
        }
    }

    async fn run(&self, request: &RelocationRequest) -> Result<RelocationOutcome, RelocationError> {
        RelocationPlanner::validate(request)?;
        RelocationPlanner::check_destination(&request.destination_directory).await?;

        let torrents = self
            .directory
            .list_handles()
            .await
            .map_err(RelocationError::TorrentListingUnavailable)?;

        let plan = self
            .planner
            .plan(&torrents, request, self.lister.as_ref())
            .await?;

        Ok(self.executor.execute(&plan).await)
    }
}
