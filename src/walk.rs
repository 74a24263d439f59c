//! Filesystem enumeration.
//!
//! [`PathEnumerator`] turns a source path into the ordered sequence of
//! entries that make up its archive: the source itself first, then its
//! contents depth-first with siblings sorted by name.

use std::path::{Path, PathBuf};

use log::{trace, warn};
use walkdir::WalkDir;

use crate::archive_path::ArchivePath;
use crate::entry::{Entry, EntryKind};
use crate::{Error, Result};

/// Lazy, depth-first enumeration of a file or directory tree.
///
/// Archive names are relative to a base directory, by default the parent of
/// the root, so the root's own name becomes the top-level component.
///
/// # Example
///
/// ```rust,no_run
/// use tarstream::walk::PathEnumerator;
///
/// for entry in PathEnumerator::new("data", false)? {
///     let entry = entry?;
///     println!("{} ({} bytes)", entry.path(), entry.size());
/// }
/// # Ok::<(), tarstream::Error>(())
/// ```
pub struct PathEnumerator {
    walker: walkdir::IntoIter,
    root: PathBuf,
    base: PathBuf,
}

impl PathEnumerator {
    /// Starts enumerating `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] if `root` does not exist and
    /// [`Error::InvalidArchivePath`] if it has no final name component.
    pub fn new(root: impl AsRef<Path>, follow_links: bool) -> Result<Self> {
        let (base, name) = split_root(root.as_ref())?;
        let root = base.join(&name);
        Self::with_base(root, base, follow_links)
    }

    /// Starts enumerating `root`, naming entries relative to `base`.
    pub(crate) fn with_base(root: PathBuf, base: PathBuf, follow_links: bool) -> Result<Self> {
        let exists = if follow_links {
            root.metadata()
        } else {
            root.symlink_metadata()
        };
        match exists {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound { path: root });
            }
            Err(e) => return Err(Error::entry_io(root, e)),
        }

        trace!("Enumerating {} relative to {}", root.display(), base.display());

        let walker = WalkDir::new(&root)
            .follow_links(follow_links)
            .sort_by_file_name()
            .into_iter();

        Ok(Self { walker, root, base })
    }

    /// Returns the root being enumerated.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory archive names are relative to.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn entry_for(&self, dir_entry: walkdir::DirEntry) -> Result<Entry> {
        let relative = dir_entry
            .path()
            .strip_prefix(&self.base)
            .map_err(|_| {
                Error::InvalidArchivePath(format!(
                    "'{}' is outside '{}'",
                    dir_entry.path().display(),
                    self.base.display()
                ))
            })?;
        let name = ArchivePath::from_relative(relative)?;

        let metadata = dir_entry
            .metadata()
            .map_err(|e| walk_error(e, dir_entry.path()))?;
        let entry = Entry::from_metadata(dir_entry.into_path(), name, &metadata)?;

        if entry.kind() == EntryKind::Other {
            warn!(
                "{} is a special file; archiving its header only",
                entry.source().display()
            );
        }
        Ok(entry)
    }
}

impl Iterator for PathEnumerator {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.walker.next()? {
            Ok(dir_entry) => self.entry_for(dir_entry),
            Err(e) => {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                Err(walk_error(e, &path))
            }
        };
        Some(item)
    }
}

impl std::fmt::Debug for PathEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathEnumerator")
            .field("root", &self.root)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

/// Splits a source path into the directory holding it and its final name.
///
/// `.` components and trailing separators are ignored. A relative source with
/// no parent is placed under `.`; a source that names no entry of its own
/// (such as `.` or `..`) is resolved against the current directory first.
pub(crate) fn split_root(source: &Path) -> Result<(PathBuf, PathBuf)> {
    let normalized: PathBuf = source.components().collect();

    let resolved = match normalized.file_name() {
        Some(_) => normalized,
        None if normalized.has_root() => {
            return Err(invalid_root(source));
        }
        None => match std::fs::canonicalize(&normalized) {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound {
                    path: source.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::entry_io(source, e)),
        },
    };

    let name = resolved
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| invalid_root(source))?;
    let base = match resolved.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((base, name))
}

fn invalid_root(source: &Path) -> Error {
    Error::InvalidArchivePath(format!(
        "'{}' has no name to archive it under",
        source.display()
    ))
}

fn walk_error(e: walkdir::Error, path: &Path) -> Error {
    let path = path.to_path_buf();
    match e.into_io_error() {
        Some(io) => Error::entry_io(path, io),
        None => Error::entry_io(
            path,
            std::io::Error::other("filesystem loop detected while following links"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(enumerator: PathEnumerator) -> Vec<String> {
        enumerator
            .map(|e| e.unwrap().path().as_str().to_string())
            .collect()
    }

    #[test]
    fn test_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.txt");
        fs::write(&file, b"hello").unwrap();

        let entries: Vec<_> = PathEnumerator::new(&file, false)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path().as_str(), "report.txt");
        assert_eq!(entries[0].size(), 5);
    }

    #[test]
    fn test_tree_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/inner/z.txt"), b"z").unwrap();
        fs::write(root.join("b/c.txt"), b"c").unwrap();
        fs::write(root.join("a/file.txt"), b"a").unwrap();

        let names = names(PathEnumerator::new(&root, false).unwrap());
        assert_eq!(
            names,
            vec![
                "data",
                "data/a",
                "data/a/file.txt",
                "data/b",
                "data/b/c.txt",
                "data/b/inner",
                "data/b/inner/z.txt",
            ]
        );
    }

    #[test]
    fn test_trailing_separator_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        fs::create_dir(&root).unwrap();

        let with_slash = format!("{}/", root.display());
        let names = names(PathEnumerator::new(&with_slash, false).unwrap());
        assert_eq!(names, vec!["data"]);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = PathEnumerator::new(dir.path().join("nope"), false).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[test]
    fn test_filesystem_root_rejected() {
        let err = PathEnumerator::new("/", false).unwrap_err();
        assert!(matches!(err, Error::InvalidArchivePath(_)));
    }

    #[test]
    fn test_split_root() {
        let (base, name) = split_root(Path::new("data")).unwrap();
        assert_eq!(base, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("data"));

        let (base, name) = split_root(Path::new("/srv/./www/")).unwrap();
        assert_eq!(base, PathBuf::from("/srv"));
        assert_eq!(name, PathBuf::from("www"));
    }

    #[test]
    fn test_with_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data/sub")).unwrap();
        fs::write(dir.path().join("data/sub/f"), b"").unwrap();

        let enumerator = PathEnumerator::with_base(
            dir.path().join("data/sub"),
            dir.path().to_path_buf(),
            false,
        )
        .unwrap();
        assert_eq!(names(enumerator), vec!["data/sub", "data/sub/f"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("real.txt"), b"content").unwrap();
        std::os::unix::fs::symlink("real.txt", root.join("link")).unwrap();

        let entries: Vec<_> = PathEnumerator::new(&root, false)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let link = entries
            .iter()
            .find(|e| e.path().as_str() == "data/link")
            .unwrap();
        assert_eq!(link.kind(), EntryKind::Symlink);
        assert_eq!(link.size(), 0);

        let followed: Vec<_> = PathEnumerator::new(&root, true)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let link = followed
            .iter()
            .find(|e| e.path().as_str() == "data/link")
            .unwrap();
        assert_eq!(link.kind(), EntryKind::File);
        assert_eq!(link.size(), 7);
    }
}
