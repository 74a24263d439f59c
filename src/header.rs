//! USTAR header construction.
//!
//! Every entry in the stream is described by exactly one 512-byte
//! [`tar::Header`] in the POSIX.1-1988 layout (`ustar\0` magic, version `00`).
//! Field encoding, the GNU base-256 fallback for large numbers and the
//! checksum are left to the `tar` crate; this module decides what goes into
//! the fields.
//!
//! Long names are split between the `prefix` and `name` fields. A name that
//! cannot be split is rejected with [`Error::NameTooLong`]: extension records
//! would add blocks the size oracle does not account for.

use std::fs::Metadata;
use std::path::Path;

use filetime::FileTime;
use tar::{EntryType, Header, HeaderMode};

use crate::archive_path::ArchivePath;
use crate::config::StreamConfig;
use crate::entry::{self, Entry, EntryKind};
use crate::{Error, Result};

/// Builds header blocks for registered entries.
///
/// The builder re-reads the entry's metadata when the header is produced so
/// that permissions and timestamps reflect the file as it is streamed, while
/// the size stays the one announced at registration.
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    follow_links: bool,
    mode: HeaderMode,
    mtime_override: Option<u64>,
}

impl HeaderBuilder {
    /// Creates a builder from stream configuration.
    ///
    /// Without [`StreamConfig::preserve_ownership`] the metadata is read in
    /// [`HeaderMode::Deterministic`], which writes zero owner and group IDs.
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            follow_links: config.follow_links,
            mode: if config.preserve_ownership {
                HeaderMode::Complete
            } else {
                HeaderMode::Deterministic
            },
            mtime_override: config.mtime_override,
        }
    }

    /// Builds the header for `entry`, reading its current metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryIo`] if the entry's metadata cannot be read and
    /// [`Error::EntryChanged`] if it is no longer the kind it was registered as.
    pub fn build(&self, entry: &Entry) -> Result<Header> {
        let metadata = entry::read_metadata(entry.source(), self.follow_links)?;
        let current = EntryKind::from_file_type(metadata.file_type());
        if current != entry.kind() {
            return Err(Error::EntryChanged {
                path: entry.source().to_path_buf(),
                reason: format!("was a {}, now a {}", entry.kind(), current),
            });
        }
        self.build_from_metadata(entry, &metadata)
    }

    /// Builds the header for `entry` from already-read metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameTooLong`] if the name or link target does not fit.
    pub fn build_from_metadata(&self, entry: &Entry, metadata: &Metadata) -> Result<Header> {
        let mut header = Header::new_ustar();
        header.set_metadata_in_mode(metadata, self.mode);

        set_name(&mut header, entry.path(), entry.is_directory())?;
        if let Some(target) = entry.link_target() {
            set_link_target(&mut header, target)?;
        }

        // The tar crate writes the full st_mode and the live file length.
        header.set_mode(permission_bits(metadata));
        header.set_size(entry.size());
        header.set_mtime(self.mtime(metadata));

        let flag = entry_type(entry.kind(), metadata);
        header.set_entry_type(flag);
        if flag.is_character_special() || flag.is_block_special() {
            let (major, minor) = device_numbers(metadata);
            header
                .set_device_major(major)
                .and_then(|()| header.set_device_minor(minor))
                .map_err(|e| Error::entry_io(entry.source(), e))?;
        }

        header.set_cksum();
        Ok(header)
    }

    fn mtime(&self, metadata: &Metadata) -> u64 {
        self.mtime_override.unwrap_or_else(|| {
            let secs = FileTime::from_last_modification_time(metadata).unix_seconds();
            u64::try_from(secs).unwrap_or(0)
        })
    }
}

/// Checks that an entry can be described by a single header.
///
/// Called at registration so that the announced size never has to change.
pub(crate) fn check_entry(entry: &Entry) -> Result<()> {
    let mut scratch = Header::new_ustar();
    set_name(&mut scratch, entry.path(), entry.is_directory())?;
    if let Some(target) = entry.link_target() {
        set_link_target(&mut scratch, target)?;
    }
    Ok(())
}

/// Splits an archive name into USTAR `(prefix, name)` fields.
///
/// Directories get a trailing `/`. Names up to 100 bytes go into the name
/// field alone; longer names are split at a `/` so that the prefix holds at
/// most 155 bytes and the name at most 100.
///
/// # Errors
///
/// Returns [`Error::NameTooLong`] if no such split exists.
///
/// # Example
///
/// ```rust
/// use tarstream::ArchivePath;
/// use tarstream::header::split_name;
///
/// let data = ArchivePath::new("data").unwrap();
/// assert_eq!(split_name(&data, true).unwrap(), (String::new(), "data/".to_string()));
///
/// let long = ArchivePath::new(&format!("{}/{}", "d".repeat(120), "file.txt")).unwrap();
/// let (prefix, name) = split_name(&long, false).unwrap();
/// assert_eq!(prefix, "d".repeat(120));
/// assert_eq!(name, "file.txt");
/// ```
pub fn split_name(path: &ArchivePath, is_directory: bool) -> Result<(String, String)> {
    let mut header = Header::new_ustar();
    set_name(&mut header, path, is_directory)?;
    let ustar = header.as_ustar().ok_or_else(|| too_long(path.as_str()))?;
    Ok((field_text(&ustar.prefix), field_text(&ustar.name)))
}

fn set_name(header: &mut Header, path: &ArchivePath, is_directory: bool) -> Result<()> {
    let name = if is_directory {
        format!("{}/", path)
    } else {
        path.to_string()
    };
    header
        .set_path(&name)
        .map_err(|_| too_long(path.as_str()))
}

fn set_link_target(header: &mut Header, target: &Path) -> Result<()> {
    header
        .set_link_name(target)
        .map_err(|_| too_long(&target.to_string_lossy()))
}

fn too_long(path: &str) -> Error {
    Error::NameTooLong {
        path: path.to_string(),
    }
}

fn field_text(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    let base = if metadata.is_dir() { 0o755 } else { 0o644 };
    if metadata.permissions().readonly() {
        base & 0o555
    } else {
        base
    }
}

#[cfg(unix)]
fn entry_type(kind: EntryKind, metadata: &Metadata) -> EntryType {
    use std::os::unix::fs::FileTypeExt;

    match kind {
        EntryKind::File => EntryType::file(),
        EntryKind::Directory => EntryType::dir(),
        EntryKind::Symlink => EntryType::symlink(),
        EntryKind::Other => {
            let file_type = metadata.file_type();
            if file_type.is_char_device() {
                EntryType::character_special()
            } else if file_type.is_block_device() {
                EntryType::block_special()
            } else {
                // Sockets have no tar representation; describe them as FIFOs.
                EntryType::fifo()
            }
        }
    }
}

#[cfg(not(unix))]
fn entry_type(kind: EntryKind, _metadata: &Metadata) -> EntryType {
    match kind {
        EntryKind::File => EntryType::file(),
        EntryKind::Directory => EntryType::dir(),
        EntryKind::Symlink => EntryType::symlink(),
        EntryKind::Other => EntryType::fifo(),
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn device_numbers(metadata: &Metadata) -> (u32, u32) {
    use std::os::unix::fs::MetadataExt;

    let rdev = metadata.rdev();
    let major = ((rdev >> 8) & 0xfff) | ((rdev >> 32) & !0xfff);
    let minor = (rdev & 0xff) | ((rdev >> 12) & !0xff);
    (
        u32::try_from(major).unwrap_or(0),
        u32::try_from(minor).unwrap_or(0),
    )
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn device_numbers(_metadata: &Metadata) -> (u32, u32) {
    (0, 0)
}
