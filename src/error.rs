//! Error types for tar streaming operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when building a tar stream, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Errors are
//! surfaced synchronously where they occur: while registering entries, while
//! finalizing, or while pulling a chunk. Nothing is retried internally.
//!
//! ```rust,no_run
//! use tarstream::{Error, StreamConfig, TarStream};
//!
//! fn archive_size(path: &str) -> tarstream::Result<u64> {
//!     match TarStream::from_path(path, StreamConfig::default()) {
//!         Ok(stream) => Ok(stream.tell()),
//!         Err(Error::SourceNotFound { path }) => {
//!             eprintln!("Nothing to archive at {}", path.display());
//!             Ok(0)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// The main error type for tar streaming operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`EntryIo`][Self::EntryIo], [`EntryChanged`][Self::EntryChanged] | File system operations |
/// | Input | [`SourceNotFound`][Self::SourceNotFound], [`InvalidArchivePath`][Self::InvalidArchivePath], [`NameTooLong`][Self::NameTooLong], [`InvalidBufferSize`][Self::InvalidBufferSize] | Bad arguments |
/// | Fatal | [`AlreadyFinalized`][Self::AlreadyFinalized], [`Misaligned`][Self::Misaligned] | Internal logic defects |
/// | Usage | [`NotAcceptingEntries`][Self::NotAcceptingEntries], [`NotFinalized`][Self::NotFinalized] | Calls out of lifecycle order |
/// | Transfer | [`InvalidDestination`][Self::InvalidDestination], [`EndpointNotFound`][Self::EndpointNotFound], [`DestinationNotFound`][Self::DestinationNotFound] | Collaborators |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error not tied to a specific archive entry.
    ///
    /// Typically raised by sinks writing the produced stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reading metadata or content of an entry failed.
    ///
    /// The entry may have vanished or become unreadable after it was
    /// discovered.
    #[error("I/O error on '{}': {source}", path.display())]
    EntryIo {
        /// Filesystem path of the entry.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The source path does not exist.
    ///
    /// Raised when the stream is constructed, so a missing source never
    /// degrades into an empty archive.
    #[error("Source not found: {}", path.display())]
    SourceNotFound {
        /// The path that could not be found.
        path: PathBuf,
    },

    /// A name cannot be placed in a header.
    ///
    /// See [`ArchivePath::new`](crate::ArchivePath::new) for the rules. The
    /// message carries the offending name and the reason.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// A name or link target does not fit in a USTAR header.
    ///
    /// Every entry must be described by exactly one 512-byte header so that
    /// the total size is known before streaming.
    #[error("Name too long for a USTAR header: {path}")]
    NameTooLong {
        /// The archive name or link target that does not fit.
        path: String,
    },

    /// The configured buffer size is zero.
    #[error("Buffer size must be greater than zero")]
    InvalidBufferSize,

    /// `finalize()` was called more than once.
    #[error("Stream already finalized")]
    AlreadyFinalized,

    /// The total size is not a multiple of the block size after finalizing.
    #[error("Stream size {size} is not aligned to the 512-byte block size")]
    Misaligned {
        /// The misaligned total size.
        size: u64,
    },

    /// An entry was registered after the stream was finalized.
    #[error("Stream is not accepting entries")]
    NotAcceptingEntries,

    /// A chunk was pulled before the stream was finalized.
    #[error("Stream must be finalized before reading")]
    NotFinalized,

    /// An entry changed between registration and streaming.
    ///
    /// The announced size is frozen at registration; a file that shrank or
    /// changed type cannot honour it.
    #[error("Entry '{}' changed while streaming: {reason}", path.display())]
    EntryChanged {
        /// Filesystem path of the entry.
        path: PathBuf,
        /// What changed.
        reason: String,
    },

    /// A destination identifier could not be parsed.
    ///
    /// Destinations are written as `name:path`.
    #[error("Invalid destination '{0}': expected NAME:PATH")]
    InvalidDestination(String),

    /// The named endpoint does not exist.
    #[error("Endpoint not found: {name}")]
    EndpointNotFound {
        /// The endpoint name.
        name: String,
    },

    /// The destination path does not exist on the endpoint.
    #[error("Destination not found: {path}")]
    DestinationNotFound {
        /// The destination path on the endpoint.
        path: String,
    },
}

impl Error {
    /// Wraps an I/O error with the path of the entry it belongs to.
    pub(crate) fn entry_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::EntryIo {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this error indicates an internal logic defect.
    ///
    /// Fatal errors abort construction of the stream and are never retried.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tarstream::Error;
    ///
    /// assert!(Error::AlreadyFinalized.is_fatal());
    /// assert!(!Error::NotFinalized.is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::AlreadyFinalized | Error::Misaligned { .. })
    }

    /// Returns `true` if this error reports something that does not exist.
    ///
    /// Covers a missing source, a missing endpoint and a missing destination
    /// path, as well as I/O errors of kind [`io::ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::SourceNotFound { .. }
            | Error::EndpointNotFound { .. }
            | Error::DestinationNotFound { .. } => true,
            Error::Io(e) | Error::EntryIo { source: e, .. } => {
                e.kind() == io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

/// A specialized Result type for tar streaming operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::Io(e) | Error::EntryIo { source: e, .. } => e.kind(),
            other if other.is_not_found() => io::ErrorKind::NotFound,
            _ => io::ErrorKind::Other,
        };
        match err {
            Error::Io(e) => e,
            // Keep the entry path in the message.
            other => io::Error::new(kind, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Misaligned { size: 513 };
        assert_eq!(
            err.to_string(),
            "Stream size 513 is not aligned to the 512-byte block size"
        );

        let err = Error::SourceNotFound {
            path: PathBuf::from("missing/dir"),
        };
        assert_eq!(err.to_string(), "Source not found: missing/dir");

        let err = Error::InvalidDestination("nocolon".into());
        assert_eq!(
            err.to_string(),
            "Invalid destination 'nocolon': expected NAME:PATH"
        );
    }

    #[test]
    fn test_entry_io_display() {
        let err = Error::entry_io(
            "data/file.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on 'data/file.txt': denied");
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::AlreadyFinalized.is_fatal());
        assert!(Error::Misaligned { size: 1 }.is_fatal());
        assert!(!Error::NotAcceptingEntries.is_fatal());
        assert!(!Error::Io(io::Error::other("x")).is_fatal());
    }

    #[test]
    fn test_is_not_found() {
        assert!(
            Error::SourceNotFound {
                path: PathBuf::from("x")
            }
            .is_not_found()
        );
        assert!(Error::EndpointNotFound { name: "c".into() }.is_not_found());
        assert!(Error::DestinationNotFound { path: "/p".into() }.is_not_found());
        assert!(Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone")).is_not_found());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "no")).is_not_found());
        assert!(!Error::InvalidBufferSize.is_not_found());
    }

    #[test]
    fn test_into_io_error() {
        let io_err: io::Error = Error::EndpointNotFound { name: "c".into() }.into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);

        let io_err: io::Error = Error::NotFinalized.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);

        let io_err: io::Error = Error::entry_io(
            "f",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }
}
