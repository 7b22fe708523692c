//! Torrent daemon client abstraction.
//!
//! This module provides a `TorrentClient` trait for the daemon the bot
//! controls, and its qBittorrent Web API implementation.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub(crate) use qbittorrent::extract_hash_from_magnet;
pub use types::*;
