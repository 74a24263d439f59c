//! Archive entries.
//!
//! An [`Entry`] is the immutable description of one filesystem object that
//! has been registered with a stream: where it lives on disk, the name it gets
//! in the archive, its kind, and the content size that was announced for it.

use std::fs::{self, FileType, Metadata};
use std::path::{Path, PathBuf};

use crate::archive_path::ArchivePath;
use crate::block;
use crate::{Error, Result};

/// The kind of filesystem object an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A regular file; the only kind with content.
    File,
    /// A directory.
    Directory,
    /// A symbolic link (only when links are not followed).
    Symlink,
    /// A FIFO, socket or device node.
    Other,
}

impl EntryKind {
    /// Classifies a file type.
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        }
    }

    /// Returns a human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "regular file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "special file",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filesystem object registered for archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path on disk.
    source: PathBuf,
    /// Name inside the archive.
    path: ArchivePath,
    kind: EntryKind,
    /// Content size; always 0 unless `kind` is `File`.
    size: u64,
    /// Symlink target, captured when the entry was created.
    link_target: Option<PathBuf>,
}

impl Entry {
    /// Creates an entry by reading the metadata of `source`.
    ///
    /// With `follow_links` the entry describes the link target; otherwise a
    /// symlink becomes a [`EntryKind::Symlink`] entry and its target is read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryIo`] if the metadata or link target cannot be read.
    pub fn from_path(
        source: impl Into<PathBuf>,
        path: ArchivePath,
        follow_links: bool,
    ) -> Result<Self> {
        let source = source.into();
        let metadata = read_metadata(&source, follow_links)?;
        Self::from_metadata(source, path, &metadata)
    }

    /// Creates an entry from already-read metadata.
    pub(crate) fn from_metadata(
        source: PathBuf,
        path: ArchivePath,
        metadata: &Metadata,
    ) -> Result<Self> {
        let kind = EntryKind::from_file_type(metadata.file_type());
        let size = if kind == EntryKind::File {
            metadata.len()
        } else {
            0
        };
        let link_target = if kind == EntryKind::Symlink {
            Some(fs::read_link(&source).map_err(|e| Error::entry_io(&source, e))?)
        } else {
            None
        };

        Ok(Self {
            source,
            path,
            kind,
            size,
            link_target,
        })
    }

    /// Returns the path of the entry on disk.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the name of the entry inside the archive.
    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    /// Returns the kind of the entry.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns true if the entry is a regular file with a content stream.
    pub fn is_regular_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns true if the entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns the announced content size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the symlink target, if this is a symlink entry.
    pub fn link_target(&self) -> Option<&Path> {
        self.link_target.as_deref()
    }

    /// Returns the number of bytes the entry occupies in the stream.
    pub fn footprint(&self) -> u64 {
        block::entry_footprint(self.is_regular_file(), self.size)
    }

    /// Returns the zero fill that follows the entry's content.
    pub fn padding(&self) -> u64 {
        if self.is_regular_file() {
            block::padding(self.size, block::BLOCK_SIZE)
        } else {
            0
        }
    }
}

/// Reads metadata, following links or not.
pub(crate) fn read_metadata(path: &Path, follow_links: bool) -> Result<Metadata> {
    let metadata = if follow_links {
        fs::metadata(path)
    } else {
        fs::symlink_metadata(path)
    };
    metadata.map_err(|e| Error::entry_io(path, e))
}
