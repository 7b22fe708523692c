//! Status and listing texts.

use std::fmt::Write;

use crate::messages;
use crate::torrent_client::{TorrentFile, TorrentInfo};

/// Width of the status progress bar in cells.
pub const PROGRESS_BAR_WIDTH: usize = 20;

/// Renders `progress` (0.0 - 1.0) as filled and empty block cells.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let progress = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((width as f64) * progress) as usize;
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(width - filled));
    bar
}

/// One block per torrent with name, progress and state.
pub fn format_status(torrents: &[TorrentInfo]) -> String {
    if torrents.is_empty() {
        return messages::NO_ACTIVE_TORRENTS.to_string();
    }

    let mut text = String::new();
    for torrent in torrents {
        let _ = write!(
            text,
            "Name: {}\nProgress: {:.2}% [{}]\nState: {}\n\n",
            torrent.name,
            torrent.progress * 100.0,
            progress_bar(torrent.progress, PROGRESS_BAR_WIDTH),
            torrent.state.as_str()
        );
    }
    text.trim_end().to_string()
}

/// File names of a torrent, one per line.
pub fn format_file_list(name_or_hash: &str, files: &[TorrentFile]) -> String {
    if files.is_empty() {
        return messages::NO_FILES_IN_TORRENT.to_string();
    }

    let mut text = format!("Files in torrent '{name_or_hash}':\n\n");
    for file in files {
        let _ = writeln!(text, "{}", file.name);
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::downloading_torrent;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(0.99, 4), "███░");
        assert_eq!(progress_bar(1.0, 4), "████");
        assert_eq!(progress_bar(1.7, 4), "████");
        assert_eq!(progress_bar(f64::NAN, 4), "░░░░");
        assert_eq!(progress_bar(0.25, PROGRESS_BAR_WIDTH).chars().count(), 20);
    }

    #[test]
    fn test_format_status() {
        let torrents = vec![downloading_torrent("h1", "Big Buck Bunny", 0.5)];
        assert_eq!(
            format_status(&torrents),
            "Name: Big Buck Bunny\nProgress: 50.00% [██████████░░░░░░░░░░]\nState: downloading"
        );
    }

    #[test]
    fn test_format_status_empty() {
        assert_eq!(format_status(&[]), messages::NO_ACTIVE_TORRENTS);
    }

    #[test]
    fn test_format_file_list() {
        let files = vec![
            TorrentFile::named("Show/ep1.mkv"),
            TorrentFile::named("Show/ep2.mkv"),
        ];
        assert_eq!(
            format_file_list("Show", &files),
            "Files in torrent 'Show':\n\nShow/ep1.mkv\nShow/ep2.mkv"
        );
        assert_eq!(format_file_list("Show", &[]), messages::NO_FILES_IN_TORRENT);
    }
}
