//! Consolidated chat report for a relocation.

use std::fmt::Write;

use super::error::RelocationError;
use super::types::RelocationOutcome;
use crate::messages;

/// Renders the single message a user receives after a relocation.
pub fn render_report(outcome: &RelocationOutcome) -> String {
    let mut text = String::new();

    if outcome.is_no_match() {
        text.push_str(messages::NO_MATCHING_FILES);
    } else if !outcome.moved.is_empty() {
        text.push_str("Moved files:\n");
        for name in &outcome.moved {
            let _ = writeln!(text, "{name}");
        }
        let _ = write!(text, "to {}", outcome.destination_directory.display());
    } else {
        text.push_str("No files were moved.");
    }

    if !outcome.failed.is_empty() {
        text.push_str("\n\nFailed:");
        for failure in &outcome.failed {
            let _ = write!(text, "\n{}: {}", failure.display_name, failure.reason);
        }
    }

    if !outcome.skipped_torrents.is_empty() {
        text.push_str("\n\nSkipped torrents:");
        for skipped in &outcome.skipped_torrents {
            let _ = write!(text, "\n{}: {}", skipped.name, skipped.reason);
        }
    }

    text
}

/// Renders a request-level failure.
pub fn render_error(error: &RelocationError) -> String {
    match error {
        RelocationError::DestinationNotFound { .. } => messages::DESTINATION_NOT_FOUND.to_string(),
        RelocationError::TorrentListingUnavailable(e) if e.is_connectivity() => {
            messages::DAEMON_UNREACHABLE.to_string()
        }
        RelocationError::TorrentListingUnavailable(e) => messages::error_occurred(e),
        RelocationError::InvalidRequest(reason) => messages::error_occurred(reason),
    }
}
