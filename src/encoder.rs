//! The pull-based tar stream encoder.
//!
//! A [`TarStream`] collects entries, announces the exact archive size before
//! any byte is produced, and then hands the archive out in bounded chunks.
//!
//! # Example
//!
//! ```rust,no_run
//! use tarstream::{StreamConfig, TarStream};
//!
//! let mut stream = TarStream::new("/srv", StreamConfig::default())?;
//! stream.add_item("www")?;
//! stream.add_item("www/index.html")?;
//! stream.finalize()?;
//!
//! let total = stream.tell();
//! let mut sent = 0;
//! loop {
//!     let chunk = stream.next_chunk()?;
//!     if chunk.is_empty() {
//!         break;
//!     }
//!     sent += chunk.len() as u64;
//! }
//! assert_eq!(sent, total);
//! # Ok::<(), tarstream::Error>(())
//! ```

use std::io::{self, Read, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::archive_path::ArchivePath;
use crate::block::{self, TERMINATOR_SIZE};
use crate::chain::StreamChain;
use crate::config::StreamConfig;
use crate::entry::Entry;
use crate::header::{self, HeaderBuilder};
use crate::walk::{self, PathEnumerator};
use crate::{Error, Result};

/// Lifecycle of a [`TarStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// No entries registered yet.
    Idle,
    /// At least one entry registered; more may follow.
    Accepting,
    /// Terminator appended and size frozen; nothing pulled yet.
    Finalized,
    /// Chunks are being pulled.
    Streaming,
    /// Every byte has been produced, or the stream was closed.
    Exhausted,
}

impl EncoderState {
    /// Returns true if entries may still be registered.
    pub fn is_accepting_entries(&self) -> bool {
        matches!(self, EncoderState::Idle | EncoderState::Accepting)
    }

    /// Returns true if the total size is final.
    pub fn is_finalized(&self) -> bool {
        !self.is_accepting_entries()
    }
}

/// A tar archive produced on demand from filesystem entries.
///
/// Entries are registered with [`add_item`](Self::add_item),
/// [`add_tree`](Self::add_tree) or [`register`](Self::register); each one
/// immediately adds its exact footprint to [`tell`](Self::tell). After
/// [`finalize`](Self::finalize) the archive is pulled with
/// [`next_chunk`](Self::next_chunk), by iterating, or through [`Read`].
///
/// Only one chunk buffer and one header block are held in memory, and at
/// most one file is open at any time.
#[derive(Debug)]
pub struct TarStream {
    root_dir: PathBuf,
    config: StreamConfig,
    state: EncoderState,
    chain: StreamChain,
    cumulative_size: u64,
    bytes_emitted: u64,
    entry_count: usize,
    iteration_done: bool,
}

impl TarStream {
    /// Creates an empty stream whose relative paths resolve against `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBufferSize`] if `config.buffer_size` is zero and
    /// [`Error::SourceNotFound`] if `root_dir` does not exist.
    pub fn new(root_dir: impl Into<PathBuf>, config: StreamConfig) -> Result<Self> {
        if config.buffer_size == 0 {
            return Err(Error::InvalidBufferSize);
        }

        let root_dir = root_dir.into();
        match root_dir.metadata() {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound { path: root_dir });
            }
            Err(e) => return Err(Error::entry_io(root_dir, e)),
        }

        debug!(
            "Created tar stream rooted at {} ({} byte chunks)",
            root_dir.display(),
            config.buffer_size
        );

        Ok(Self {
            chain: StreamChain::new(HeaderBuilder::new(&config)),
            root_dir,
            config,
            state: EncoderState::Idle,
            cumulative_size: 0,
            bytes_emitted: 0,
            entry_count: 0,
            iteration_done: false,
        })
    }

    /// Builds a finalized stream for a file or directory tree.
    ///
    /// The source's parent becomes the root directory, so the archive's top
    /// level is the source's own name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] if the source does not exist,
    /// [`Error::InvalidArchivePath`] if it has no name (such as `/`), and any
    /// error raised while registering the tree.
    pub fn from_path(source: impl AsRef<Path>, config: StreamConfig) -> Result<Self> {
        let (base, name) = walk::split_root(source.as_ref())?;
        let mut stream = Self::new(base, config)?;
        stream.add_tree(name)?;
        stream.finalize()?;
        Ok(stream)
    }

    /// Registers the single filesystem object at `root_dir/relative_path`.
    ///
    /// Directories are registered without their contents; use
    /// [`add_tree`](Self::add_tree) for that.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAcceptingEntries`] after finalize,
    /// [`Error::InvalidArchivePath`] or [`Error::NameTooLong`] for names
    /// that cannot be archived, and [`Error::EntryIo`] if the object cannot
    /// be inspected.
    pub fn add_item(&mut self, relative_path: impl AsRef<Path>) -> Result<()> {
        self.ensure_accepting_entries()?;
        let relative_path = relative_path.as_ref();
        let name = ArchivePath::from_relative(relative_path)?;
        let entry = Entry::from_path(
            self.root_dir.join(relative_path),
            name,
            self.config.follow_links,
        )?;
        self.register(entry)
    }

    /// Registers `root_dir/relative_path` and everything beneath it.
    ///
    /// Returns the number of entries registered. If an entry fails part way,
    /// the entries before it stay registered.
    pub fn add_tree(&mut self, relative_path: impl AsRef<Path>) -> Result<usize> {
        self.ensure_accepting_entries()?;
        let enumerator = PathEnumerator::with_base(
            self.root_dir.join(relative_path.as_ref()),
            self.root_dir.clone(),
            self.config.follow_links,
        )?;

        let mut added = 0;
        for entry in enumerator {
            self.register(entry?)?;
            added += 1;
        }
        Ok(added)
    }

    /// Registers a prepared entry.
    pub fn register(&mut self, entry: Entry) -> Result<()> {
        self.ensure_accepting_entries()?;
        header::check_entry(&entry)?;

        self.cumulative_size += entry.footprint();
        self.entry_count += 1;
        trace!(
            "Registered {} {} ({} bytes); total {}",
            entry.kind(),
            entry.path(),
            entry.size(),
            self.cumulative_size
        );
        self.chain.push_entry(entry);
        self.state = EncoderState::Accepting;
        Ok(())
    }

    /// Appends the end-of-archive marker and freezes the total size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyFinalized`] on a second call and
    /// [`Error::Misaligned`] if the registered size is not block aligned.
    pub fn finalize(&mut self) -> Result<()> {
        if !self.state.is_accepting_entries() {
            return Err(Error::AlreadyFinalized);
        }
        if !block::is_aligned(self.cumulative_size) {
            return Err(Error::Misaligned {
                size: self.cumulative_size,
            });
        }

        self.cumulative_size += TERMINATOR_SIZE;
        self.chain.push_terminator();
        self.state = EncoderState::Finalized;
        debug!(
            "Finalized tar stream: {} entries, {} bytes",
            self.entry_count, self.cumulative_size
        );
        Ok(())
    }

    /// Returns the total archive size.
    ///
    /// Before [`finalize`](Self::finalize) this is the running total of the
    /// entries registered so far, without the terminator.
    pub fn tell(&self) -> u64 {
        self.cumulative_size
    }

    /// Accepts any seek request without moving and returns the total size.
    ///
    /// The stream is forward-only; this exists for consumers that seek to the
    /// end to learn the length.
    pub fn seek(&self, _pos: SeekFrom) -> u64 {
        self.cumulative_size
    }

    /// Produces the next chunk of at most `buffer_size` bytes.
    ///
    /// Every chunk is exactly `buffer_size` long except possibly the last
    /// non-empty one. Once the archive is complete an empty chunk is returned,
    /// on this and every later call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFinalized`] before finalize. I/O errors and
    /// [`Error::EntryChanged`] end the stream: it is closed and later calls
    /// return empty chunks.
    pub fn next_chunk(&mut self) -> Result<Vec<u8>> {
        self.check_pullable()?;
        if self.state == EncoderState::Exhausted {
            return Ok(Vec::new());
        }

        let mut chunk = vec![0u8; self.config.buffer_size];
        let n = self.pull(&mut chunk, true)?;
        chunk.truncate(n);
        Ok(chunk)
    }

    /// Closes any open file and discards the remaining archive.
    ///
    /// Safe to call in any state and more than once; afterwards the stream is
    /// [`EncoderState::Exhausted`].
    pub fn close(&mut self) {
        if self.state == EncoderState::Exhausted {
            return;
        }
        if self.state.is_finalized() && self.remaining() > 0 {
            warn!(
                "Closing tar stream with {} of {} bytes unsent ({} entries not reached)",
                self.remaining(),
                self.cumulative_size,
                self.chain.pending_entries()
            );
        }
        self.chain.clear();
        self.state = EncoderState::Exhausted;
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Returns the number of bytes handed out so far.
    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    /// Returns the number of bytes not yet handed out.
    pub fn remaining(&self) -> u64 {
        self.cumulative_size.saturating_sub(self.bytes_emitted)
    }

    /// Returns true while a file is open for reading.
    pub fn has_open_file(&self) -> bool {
        self.chain.has_open_file()
    }

    /// Returns the number of registered entries.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Returns the number of registered entries whose header has not been
    /// produced yet.
    pub fn pending_entries(&self) -> usize {
        self.chain.pending_entries()
    }

    /// Returns the chunk size bound.
    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }

    /// Returns the directory relative paths resolve against.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Returns the stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn ensure_accepting_entries(&self) -> Result<()> {
        if !self.state.is_accepting_entries() {
            return Err(Error::NotAcceptingEntries);
        }
        Ok(())
    }

    fn check_pullable(&self) -> Result<()> {
        if self.state.is_accepting_entries() {
            return Err(Error::NotFinalized);
        }
        Ok(())
    }

    /// Moves bytes from the chain into `buf`, tracking state.
    ///
    /// With `fill` the buffer is filled across sources; otherwise a single
    /// source read is made.
    fn pull(&mut self, buf: &mut [u8], fill: bool) -> Result<usize> {
        if self.state == EncoderState::Exhausted || buf.is_empty() {
            return Ok(0);
        }
        self.state = EncoderState::Streaming;

        let result = if fill {
            self.chain.fill(buf)
        } else {
            self.chain.read(buf)
        };

        match result {
            Ok(0) => {
                debug_assert!(self.chain.is_drained());
                debug_assert_eq!(self.bytes_emitted, self.cumulative_size);
                debug!("Tar stream exhausted after {} bytes", self.bytes_emitted);
                self.state = EncoderState::Exhausted;
                Ok(0)
            }
            Ok(n) => {
                self.bytes_emitted += n as u64;
                Ok(n)
            }
            Err(e) => {
                debug!(
                    "Tar stream failed after {} of {} bytes: {}",
                    self.bytes_emitted, self.cumulative_size, e
                );
                self.chain.clear();
                self.state = EncoderState::Exhausted;
                Err(e)
            }
        }
    }
}

impl Iterator for TarStream {
    type Item = Result<Vec<u8>>;

    /// Yields each chunk, then one empty chunk, then `None`.
    ///
    /// An error is yielded once and ends the iteration.
    fn next(&mut self) -> Option<Self::Item> {
        if self.iteration_done {
            return None;
        }
        match self.next_chunk() {
            Ok(chunk) => {
                if chunk.is_empty() {
                    self.iteration_done = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.iteration_done = true;
                Some(Err(e))
            }
        }
    }
}

impl Read for TarStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_pullable()?;
        Ok(self.pull(buf, false)?)
    }
}

impl Drop for TarStream {
    fn drop(&mut self) {
        self.close();
    }
}
