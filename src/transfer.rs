//! Handing a stream to whatever receives it.
//!
//! A transfer names its destination as `endpoint:path`. A [`Resolver`] turns
//! the endpoint name into an [`UploadSink`], and the sink consumes a
//! finalized [`TarStream`] for the path. [`copy_to`] wires the three
//! together for a local source.
//!
//! # Example
//!
//! ```rust,no_run
//! use tarstream::transfer::{WriterSink, copy_to};
//! use tarstream::{Error, StreamConfig};
//!
//! let resolver = |name: &str| match name {
//!     "stdout" => Ok(WriterSink::new(std::io::stdout())),
//!     _ => Err(Error::EndpointNotFound { name: name.to_string() }),
//! };
//! let sent = copy_to("data", "stdout:/", &resolver, StreamConfig::default())?;
//! eprintln!("sent {} bytes", sent);
//! # Ok::<(), Error>(())
//! ```

use std::io::Write;
use std::path::Path;

use log::debug;

use crate::config::StreamConfig;
use crate::encoder::TarStream;
use crate::{Error, Result};

/// A parsed `endpoint:path` destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    endpoint: String,
    path: String,
}

impl DestinationSpec {
    /// Parses `endpoint:path`, splitting at the first `:`.
    ///
    /// The path may itself contain `:` and may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDestination`] if there is no `:` or the
    /// endpoint name is empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tarstream::transfer::DestinationSpec;
    ///
    /// let spec = DestinationSpec::parse("web:/var/www").unwrap();
    /// assert_eq!(spec.endpoint(), "web");
    /// assert_eq!(spec.path(), "/var/www");
    ///
    /// assert!(DestinationSpec::parse("/var/www").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.split_once(':') {
            Some((endpoint, path)) if !endpoint.is_empty() => Ok(Self {
                endpoint: endpoint.to_string(),
                path: path.to_string(),
            }),
            _ => Err(Error::InvalidDestination(spec.to_string())),
        }
    }

    /// Returns the endpoint name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the path on the endpoint.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::str::FromStr for DestinationSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for DestinationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.path)
    }
}

/// Receives tar streams.
pub trait UploadSink {
    /// Consumes `stream` and stores its archive at `path`.
    ///
    /// Returns the number of bytes consumed. Implementations report a
    /// missing `path` with [`Error::DestinationNotFound`].
    fn put_archive(&mut self, path: &str, stream: &mut TarStream) -> Result<u64>;
}

/// Looks up endpoints by name.
pub trait Resolver {
    /// The sink an endpoint name resolves to.
    type Endpoint: UploadSink;

    /// Resolves `name`, failing with [`Error::EndpointNotFound`] if unknown.
    fn resolve(&self, name: &str) -> Result<Self::Endpoint>;
}

impl<F, S> Resolver for F
where
    F: Fn(&str) -> Result<S>,
    S: UploadSink,
{
    type Endpoint = S;

    fn resolve(&self, name: &str) -> Result<S> {
        self(name)
    }
}

/// An [`UploadSink`] that writes the archive to any [`Write`].
///
/// The destination path is not interpreted; the last one is kept for
/// inspection.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    bytes_written: u64,
    last_path: Option<String>,
}

impl<W: Write> WriterSink<W> {
    /// Creates a sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
            last_path: None,
        }
    }

    /// Returns the total bytes written across all archives.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the path passed to the most recent upload.
    pub fn last_path(&self) -> Option<&str> {
        self.last_path.as_deref()
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> UploadSink for WriterSink<W> {
    fn put_archive(&mut self, path: &str, stream: &mut TarStream) -> Result<u64> {
        self.last_path = Some(path.to_string());
        let mut written = 0u64;
        loop {
            let chunk = stream.next_chunk()?;
            if chunk.is_empty() {
                break;
            }
            self.writer.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        self.writer.flush()?;
        self.bytes_written += written;
        Ok(written)
    }
}

/// Archives `source` and uploads it to `destination` (`endpoint:path`).
///
/// The stream is closed whether or not the upload succeeds. Returns the
/// number of bytes the sink consumed.
pub fn copy_to<R: Resolver>(
    source: impl AsRef<Path>,
    destination: &str,
    resolver: &R,
    config: StreamConfig,
) -> Result<u64> {
    let spec = DestinationSpec::parse(destination)?;
    let mut sink = resolver.resolve(spec.endpoint())?;
    let mut stream = TarStream::from_path(source.as_ref(), config)?;

    debug!(
        "Copying {} ({} bytes) to {}",
        source.as_ref().display(),
        stream.tell(),
        spec
    );

    let result = sink.put_archive(spec.path(), &mut stream);
    stream.close();
    result
}
