//! Progress bar implementation for CLI operations.

use indicatif::{ProgressBar, ProgressStyle};

/// Byte-level progress bar for one archive
pub struct ByteProgress {
    bar: ProgressBar,
}

impl ByteProgress {
    /// Creates a new progress bar over `total` bytes
    pub fn new(total: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .map(|style| style.progress_chars("#>-"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style);
            pb
        };

        Self { bar }
    }

    /// Increments the progress
    pub fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    /// Sets the message
    pub fn set_message(&self, msg: impl Into<String>) {
        self.bar.set_message(msg.into());
    }

    /// Finishes the progress bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Leaves the bar where it stopped with a message
    pub fn abandon_with_message(&self, msg: impl Into<String>) {
        self.bar.abandon_with_message(msg.into());
    }
}
