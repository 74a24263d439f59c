//! The lazily advancing chain of byte sources behind a stream.
//!
//! Registered entries wait in a pending queue. When the chain runs dry it pops
//! the next entry, builds its header, and queues descriptions of the content
//! and zero fill that follow it. A description of file content is only opened
//! when it becomes the current source, and the file is closed as soon as its
//! registered size has been read, so at most one file is open at a time.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use log::trace;

use crate::block::{BLOCK_SIZE, TERMINATOR_SIZE};
use crate::entry::Entry;
use crate::header::HeaderBuilder;
use crate::{Error, Result};

/// Work waiting to be turned into sources.
#[derive(Debug)]
pub(crate) enum Pending {
    /// A registered entry; its header is built when it is reached.
    Entry(Entry),
    /// The two zero blocks that end the archive.
    Terminator,
}

/// Description of a source that has not been activated yet.
#[derive(Debug)]
enum SourceSpec {
    Content { path: PathBuf, len: u64 },
    Zeros(u64),
}

/// A source that is currently being read.
enum ByteSource {
    Block {
        block: Box<[u8; BLOCK_SIZE as usize]>,
        pos: usize,
    },
    Zeros {
        remaining: u64,
    },
    Content(ContentReader),
}

impl ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            ByteSource::Block { block, pos } => {
                let n = buf.len().min(block.len() - *pos);
                buf[..n].copy_from_slice(&block[*pos..*pos + n]);
                *pos += n;
                Ok(n)
            }
            ByteSource::Zeros { remaining } => {
                let n = buf.len().min(usize::try_from(*remaining).unwrap_or(usize::MAX));
                buf[..n].fill(0);
                *remaining -= n as u64;
                Ok(n)
            }
            ByteSource::Content(reader) => reader.read(buf),
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            ByteSource::Block { block, pos } => *pos == block.len(),
            ByteSource::Zeros { remaining } => *remaining == 0,
            ByteSource::Content(reader) => reader.remaining == 0,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ByteSource::Block { .. } => "header",
            ByteSource::Zeros { .. } => "zero fill",
            ByteSource::Content(_) => "content",
        }
    }
}

/// Reads exactly the registered number of bytes from a file.
///
/// Bytes beyond the registered size are never read. Running out early means
/// the file shrank after it was registered.
struct ContentReader {
    file: File,
    path: PathBuf,
    remaining: u64,
}

impl ContentReader {
    fn open(path: PathBuf, len: u64) -> Result<Self> {
        let file = File::open(&path).map_err(|e| Error::entry_io(&path, e))?;
        trace!("Opened {} ({} bytes)", path.display(), len);
        Ok(Self {
            file,
            path,
            remaining: len,
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let to_read = buf
            .len()
            .min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = loop {
            match self.file.read(&mut buf[..to_read]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::entry_io(&self.path, e)),
            }
        };

        if n == 0 {
            return Err(Error::EntryChanged {
                path: self.path.clone(),
                reason: format!("file shrank; {} bytes missing", self.remaining),
            });
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl Drop for ContentReader {
    fn drop(&mut self) {
        trace!("Closed {}", self.path.display());
    }
}

/// Ordered, lazily advancing sequence of byte sources.
pub(crate) struct StreamChain {
    builder: HeaderBuilder,
    pending: VecDeque<Pending>,
    queued: VecDeque<SourceSpec>,
    current: Option<ByteSource>,
}

impl StreamChain {
    pub(crate) fn new(builder: HeaderBuilder) -> Self {
        Self {
            builder,
            pending: VecDeque::new(),
            queued: VecDeque::new(),
            current: None,
        }
    }

    /// Appends an entry behind everything already pending.
    pub(crate) fn push_entry(&mut self, entry: Entry) {
        self.pending.push_back(Pending::Entry(entry));
    }

    /// Appends the end-of-archive marker.
    pub(crate) fn push_terminator(&mut self) {
        self.pending.push_back(Pending::Terminator);
    }

    /// Returns the number of entries not yet reached.
    pub(crate) fn pending_entries(&self) -> usize {
        self.pending
            .iter()
            .filter(|p| matches!(p, Pending::Entry(_)))
            .count()
    }

    /// Returns true while a file is open for reading.
    pub(crate) fn has_open_file(&self) -> bool {
        matches!(self.current, Some(ByteSource::Content(_)))
    }

    /// Returns true once every source has been read.
    pub(crate) fn is_drained(&self) -> bool {
        self.current.is_none() && self.queued.is_empty() && self.pending.is_empty()
    }

    /// Reads up to `buf.len()` bytes from the current source, advancing
    /// through the chain as sources run out.
    ///
    /// Returns 0 only when the chain is drained (or `buf` is empty).
    pub(crate) fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if let Some(source) = self.current.as_mut() {
                let n = source.read(buf)?;
                if source.is_finished() {
                    trace!("Finished {} source", source.kind());
                    self.current = None;
                }
                if n > 0 {
                    return Ok(n);
                }
            }
            if !self.advance()? {
                return Ok(0);
            }
        }
    }

    /// Fills `buf` from as many sources as needed.
    ///
    /// Returns fewer than `buf.len()` bytes only when the chain is drained.
    pub(crate) fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Drops the current source and all queued work, closing any open file.
    pub(crate) fn clear(&mut self) {
        self.current = None;
        self.queued.clear();
        self.pending.clear();
    }

    /// Activates the next source. Returns false when nothing is left.
    fn advance(&mut self) -> Result<bool> {
        if let Some(spec) = self.queued.pop_front() {
            let source = match spec {
                SourceSpec::Content { path, len } => {
                    ByteSource::Content(ContentReader::open(path, len)?)
                }
                SourceSpec::Zeros(len) => ByteSource::Zeros { remaining: len },
            };
            trace!("Switching to {} source", source.kind());
            self.current = Some(source);
            return Ok(true);
        }

        match self.pending.pop_front() {
            Some(Pending::Entry(entry)) => {
                let header = self.builder.build(&entry)?;
                trace!("Switching to header of {}", entry.path());
                if entry.is_regular_file() && entry.size() > 0 {
                    self.queued.push_back(SourceSpec::Content {
                        path: entry.source().to_path_buf(),
                        len: entry.size(),
                    });
                    let padding = entry.padding();
                    if padding > 0 {
                        self.queued.push_back(SourceSpec::Zeros(padding));
                    }
                }
                self.current = Some(ByteSource::Block {
                    block: Box::new(*header.as_bytes()),
                    pos: 0,
                });
                Ok(true)
            }
            Some(Pending::Terminator) => {
                trace!("Switching to terminator");
                self.current = Some(ByteSource::Zeros {
                    remaining: TERMINATOR_SIZE,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for StreamChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChain")
            .field("pending", &self.pending.len())
            .field("queued", &self.queued.len())
            .field("current", &self.current.as_ref().map(ByteSource::kind))
            .finish()
    }
}
