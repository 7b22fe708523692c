//! User-facing reply texts.

pub const HELP_TEXT: &str = "Welcome to the Courier torrent bot!\n\n\
Here are the available commands:\n\
/start - Display this message\n\
/help - Display this message\n\
/add <magnet_link_or_url> - Add a torrent\n\
/status - Show the status of active torrents\n\
/remove <torrent_name_or_hash> - Remove a torrent and its data\n\
/list <torrent_name_or_hash> - List files in a torrent\n\
/move_specific <file_pattern> <destination_path> - Move files matching a pattern\n\
/move - Move files matching a pattern, asking for the pattern and destination\n\
/cancel - Cancel the current move\n";

pub const NOT_AUTHORIZED: &str = "You are not authorized to use this bot.";
pub const DAEMON_UNREACHABLE: &str = "Failed to connect to qBittorrent. Ensure it is running.";

pub const ADD_USAGE: &str = "Please provide a magnet link or torrent URL.";
pub const TORRENT_ADDED: &str = "Torrent added successfully!";
pub const NO_ACTIVE_TORRENTS: &str = "No active torrents.";
pub const REMOVE_USAGE: &str = "Please provide the name or hash of the torrent to remove.";
pub const LIST_USAGE: &str = "Please provide the name or hash of the torrent to list files.";
pub const TORRENT_NOT_FOUND: &str = "Torrent not found.";
pub const NO_FILES_IN_TORRENT: &str = "No files found in the torrent.";

pub const MOVE_SPECIFIC_USAGE: &str = "Usage: /move_specific <file_pattern> <destination_path>";
pub const MOVE_USAGE: &str =
    "Usage: /move to choose interactively, or /move <file_pattern> <destination_path>";
pub const DESTINATION_NOT_FOUND: &str = "Destination path does not exist.";
pub const NO_MATCHING_FILES: &str = "No files matching the pattern were found.";

pub const PATTERN_PROMPT: &str = "What file pattern do you want to move?";
pub const DESTINATION_PROMPT: &str =
    "Where do you want to move the files? Provide the full destination path.\n\
     A path that looks like a command, such as /list, needs a trailing slash: /list/";
pub const OPERATION_CANCELLED: &str = "Operation cancelled.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const FLOW_IN_PROGRESS: &str = "A move is in progress. Send /cancel first.\n\
     To use a path like /list as the destination, add a trailing slash: /list/";

pub const UNKNOWN_COMMAND: &str = "Unknown command. Send /help for the list of commands.";
pub const FREE_TEXT_HINT: &str = "Send /help for the list of commands.";

/// Reply for an unexpected failure.
pub fn error_occurred(reason: impl std::fmt::Display) -> String {
    format!("An error occurred: {reason}")
}

/// Reply after a successful removal.
pub fn torrent_removed(name: &str) -> String {
    format!("Torrent '{name}' removed successfully.")
}
