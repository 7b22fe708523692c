//! Configuration for the relocation module.

use serde::{Deserialize, Serialize};

/// Whether glob patterns match case-sensitively unless configured otherwise.
///
/// Follows the host filesystem convention: Windows and macOS default
/// filesystems are case-insensitive, everything else is case-sensitive.
pub const DEFAULT_CASE_SENSITIVE: bool = !cfg!(any(windows, target_os = "macos"));

/// Configuration for planning and executing file relocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationConfig {
    /// Match patterns case-sensitively.
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Replace files already present at the destination. When false a
    /// collision is reported as a failed move and both files are left alone.
    #[serde(default)]
    pub overwrite_existing: bool,

    /// Try a rename before falling back to copy and delete.
    #[serde(default = "default_true")]
    pub prefer_atomic_moves: bool,

    /// Compare SHA-256 of source and copy before deleting the source.
    #[serde(default = "default_true")]
    pub verify_copies: bool,

    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_case_sensitive() -> bool {
    DEFAULT_CASE_SENSITIVE
}

fn default_true() -> bool {
    true
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            case_sensitive: DEFAULT_CASE_SENSITIVE,
            overwrite_existing: false,
            prefer_atomic_moves: true,
            verify_copies: true,
            buffer_size: default_buffer_size(),
        }
    }
}

impl RelocationConfig {
    /// Sets pattern case sensitivity.
    pub fn with_case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Allows replacing existing destination files.
    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite_existing = enabled;
        self
    }

    /// Enables or disables the rename fast path.
    pub fn with_atomic_moves(mut self, enabled: bool) -> Self {
        self.prefer_atomic_moves = enabled;
        self
    }

    /// Enables copy verification.
    pub fn with_copy_verification(mut self, enabled: bool) -> Self {
        self.verify_copies = enabled;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}
