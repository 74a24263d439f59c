//! # tarstream
//!
//! Streams a directory tree or a single file as a POSIX USTAR tar archive,
//! in bounded chunks, without staging the archive in memory or on disk.
//!
//! The exact size of the archive is known before the first byte is produced,
//! which is what HTTP uploads with a `Content-Length` and other
//! size-announcing transports need.
//!
//! ## Quick Start
//!
//! ### Streaming a Directory
//!
//! ```rust,no_run
//! use tarstream::{Result, StreamConfig, TarStream};
//! use std::io::Write;
//!
//! fn main() -> Result<()> {
//!     let stream = TarStream::from_path("data", StreamConfig::default())?;
//!     println!("Archive is {} bytes", stream.tell());
//!
//!     let mut out = std::fs::File::create("data.tar")?;
//!     for chunk in stream {
//!         out.write_all(&chunk?)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Registering Entries One by One
//!
//! ```rust,no_run
//! use tarstream::{Result, StreamConfig, TarStream};
//!
//! fn main() -> Result<()> {
//!     let mut stream = TarStream::new("/srv", StreamConfig::new().buffer_size(4096))?;
//!     stream.add_item("www")?;
//!     assert_eq!(stream.tell(), 512);
//!     stream.add_item("www/index.html")?;
//!     stream.finalize()?;
//!
//!     let mut body = Vec::new();
//!     std::io::copy(&mut stream, &mut body)?;
//!     assert_eq!(body.len() as u64, stream.tell());
//!     Ok(())
//! }
//! ```
//!
//! ## Archive Layout
//!
//! Each entry is one 512-byte header block, followed for regular files by the
//! content and zero fill up to the next block boundary. Two zero blocks end
//! the archive. Directories, symlinks and special files contribute a header
//! only, so the total is
//! `512 * entries + sum(round_up(file sizes)) + 1024`.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Errors surface where they happen:
//! registration, finalize, or the pull that hits them. See [`Error`].
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never
//! installs a logger of its own.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod archive_path;
pub mod block;
pub mod config;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod header;
pub mod transfer;
pub mod walk;

mod chain;

pub use archive_path::ArchivePath;
pub use block::{BLOCK_SIZE, DEFAULT_BUFFER_SIZE, TERMINATOR_SIZE, padding};
pub use config::StreamConfig;
pub use encoder::{EncoderState, TarStream};
pub use entry::{Entry, EntryKind};
pub use error::{Error, Result};
pub use header::HeaderBuilder;
pub use transfer::{DestinationSpec, Resolver, UploadSink, WriterSink, copy_to};
pub use walk::PathEnumerator;
