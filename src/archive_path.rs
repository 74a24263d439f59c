//! Validated entry names.
//!
//! Tar names are `/`-separated and relative to the archive root. An
//! [`ArchivePath`] holds a name that is safe to place in a header: no NUL
//! (it would end the field early), nothing absolute, and no segment that
//! could walk out of the extraction directory.

use crate::{Error, Result};
use std::fmt;
use std::path::{Component, Path};

/// A validated archive path.
///
/// Directory names are stored without their trailing slash; the header
/// builder appends it when writing the name field.
///
/// # Examples
///
/// ```
/// use tarstream::ArchivePath;
///
/// let path = ArchivePath::new("data/file1.txt").unwrap();
/// assert_eq!(path.as_str(), "data/file1.txt");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Validates `s` as an archive name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] for an empty name, a NUL byte, a
    /// leading `/`, or an empty, `.` or `..` segment (which includes a
    /// trailing `/`).
    pub fn new(s: &str) -> Result<Self> {
        match rejection(s) {
            Some(reason) => Err(Error::InvalidArchivePath(format!("'{}': {}", s, reason))),
            None => Ok(Self(s.to_string())),
        }
    }

    /// Converts a native relative path into an archive path.
    ///
    /// Separators are normalized to `/` and `.` components are dropped.
    /// Names must be valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use tarstream::ArchivePath;
    ///
    /// let path = ArchivePath::from_relative(Path::new("./data/file1.txt")).unwrap();
    /// assert_eq!(path.as_str(), "data/file1.txt");
    /// ```
    pub fn from_relative(path: &Path) -> Result<Self> {
        let invalid = |reason: &str| {
            Error::InvalidArchivePath(format!("'{}': {}", path.display(), reason))
        };

        let segments = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| match c {
                Component::Normal(name) => name.to_str().ok_or_else(|| invalid("not valid UTF-8")),
                Component::ParentDir => Err(invalid("'..' would escape the archive root")),
                _ => Err(invalid("absolute paths cannot be archived")),
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(&segments.join("/"))
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; validated paths are never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Returns why `s` is not a valid archive name, if it is not.
fn rejection(s: &str) -> Option<&'static str> {
    if s.is_empty() {
        return Some("empty name");
    }
    if s.contains('\0') {
        return Some("contains a NUL byte");
    }
    if s.starts_with('/') {
        return Some("absolute paths cannot be archived");
    }
    s.split('/').find_map(|segment| match segment {
        "" => Some("empty segment (doubled or trailing slash)"),
        "." => Some("'.' segment"),
        ".." => Some("'..' would escape the archive root"),
        _ => None,
    })
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&Path> for ArchivePath {
    type Error = Error;

    fn try_from(path: &Path) -> Result<Self> {
        Self::from_relative(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn reason(s: &str) -> String {
        ArchivePath::new(s).unwrap_err().to_string()
    }

    #[test]
    fn test_accepts_plain_names() {
        for ok in ["data", "data/file1.txt", "a..b/.hidden", "日本語/файл.txt"] {
            assert_eq!(ArchivePath::new(ok).unwrap().as_str(), ok);
        }
    }

    #[test]
    fn test_rejects_unsafe_names() {
        assert!(reason("").contains("empty name"));
        assert!(reason("file\0.txt").contains("NUL"));
        assert!(reason("/etc/passwd").contains("absolute"));
        assert!(reason("a//b").contains("empty segment"));
        assert!(reason("dir/").contains("trailing slash"));
        assert!(reason("./file").contains("'.'"));
        assert!(reason("a/../b").contains("escape"));
    }

    #[test]
    fn test_from_relative_normalizes() {
        let native: PathBuf = ["data", "sub", "file.txt"].iter().collect();
        assert_eq!(
            ArchivePath::from_relative(&native).unwrap().as_str(),
            "data/sub/file.txt"
        );
        assert_eq!(
            ArchivePath::from_relative(Path::new("./data/./x/")).unwrap().as_str(),
            "data/x"
        );
    }

    #[test]
    fn test_from_relative_rejects_escapes() {
        for bad in ["../x", "data/../../x", "/x", "."] {
            let err = ArchivePath::from_relative(Path::new(bad)).unwrap_err();
            assert!(matches!(err, Error::InvalidArchivePath(_)), "{}", bad);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_from_relative_requires_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = Path::new(OsStr::from_bytes(b"bad\xffname"));
        assert!(ArchivePath::from_relative(name).is_err());
    }

    #[test]
    fn test_conversions() {
        let from_str: ArchivePath = "a/b".try_into().unwrap();
        let from_path = ArchivePath::try_from(Path::new("a/b")).unwrap();
        assert_eq!(from_str, from_path);
        assert_eq!(from_str.to_string(), "a/b");
        assert_eq!(from_str.len(), 3);
        assert!(!from_str.is_empty());
    }
}
