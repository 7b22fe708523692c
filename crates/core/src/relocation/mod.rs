//! File relocation module.
//!
//! This module moves completed files out of torrent save directories:
//! - `matcher` selects file names with a shell glob
//! - `resolver` derives source and flattened destination paths
//! - `planner` builds an ordered plan across every torrent
//! - `executor` moves each planned file independently
//! - `service` ties them together behind `move_inline`

mod config;
mod error;
mod executor;
mod matcher;
mod planner;
mod report;
mod resolver;
mod service;
mod traits;
mod types;

pub use config::{RelocationConfig, DEFAULT_CASE_SENSITIVE};
pub use error::{MoveError, RelocationError, ResolveError};
pub use executor::FsExecutor;
pub use matcher::{matches, PatternMatcher};
pub use planner::RelocationPlanner;
pub use report::{render_error, render_report};
pub use resolver::{resolve, ResolvedPaths};
pub use service::{RelocationMode, RelocationService};
pub use traits::{FileLister, RelocationExecutor, TorrentDirectory};
pub use types::{
    MoveFailure, RelocationOutcome, RelocationPlan, RelocationPlanEntry, RelocationRequest,
    SkippedTorrent, TorrentHandle,
};
