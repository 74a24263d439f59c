//! Configuration for tar streaming.
//!
//! This module provides [`StreamConfig`] for controlling the chunk size and
//! how filesystem entries are described.

use crate::block::{BLOCK_SIZE, DEFAULT_BUFFER_SIZE};

/// Configuration for a tar stream with a bounded buffer.
///
/// # Example
///
/// ```rust
/// use tarstream::StreamConfig;
///
/// // Default configuration (10 KiB chunks, ownership preserved)
/// let config = StreamConfig::default();
///
/// // Custom configuration for a slow uplink
/// let config = StreamConfig::new()
///     .buffer_size(4096)
///     .follow_links(true);
/// assert_eq!(config.buffer_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Maximum size of one chunk (bytes).
    ///
    /// This is the only buffer the stream allocates for data; peak memory
    /// stays proportional to it regardless of file sizes.
    /// Default: 10 KiB (one tar record).
    pub buffer_size: usize,

    /// Follow symbolic links while enumerating and describing entries.
    ///
    /// When disabled, links are archived as link entries without content.
    /// Default: false.
    pub follow_links: bool,

    /// Record the owner and group IDs of each entry.
    ///
    /// When disabled, both are written as zero.
    /// Default: true.
    pub preserve_ownership: bool,

    /// Fixed modification time (seconds since the Unix epoch) for every entry.
    ///
    /// Default: None (use each entry's own modification time).
    pub mtime_override: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            follow_links: false,
            preserve_ownership: true,
            mtime_override: None,
        }
    }
}

impl StreamConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that holds a single block in memory.
    pub fn low_memory() -> Self {
        Self {
            buffer_size: BLOCK_SIZE as usize,
            ..Self::default()
        }
    }

    /// Creates a configuration whose output depends only on names, types,
    /// permissions and content.
    ///
    /// Ownership is dropped and every modification time is the epoch.
    pub fn deterministic() -> Self {
        Self {
            preserve_ownership: false,
            mtime_override: Some(0),
            ..Self::default()
        }
    }

    /// Sets the chunk size.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets whether symbolic links are followed.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Sets whether owner and group IDs are recorded.
    pub fn preserve_ownership(mut self, preserve: bool) -> Self {
        self.preserve_ownership = preserve;
        self
    }

    /// Sets a fixed modification time for every entry.
    pub fn mtime_override(mut self, mtime: u64) -> Self {
        self.mtime_override = Some(mtime);
        self
    }
}
