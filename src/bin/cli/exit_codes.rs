//! Exit codes for the CLI tool.

use tarstream::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Source, endpoint or destination does not exist
pub const NOT_FOUND: i32 = 3;
/// Source changed while it was being streamed
pub const SOURCE_CHANGED: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    NotFound,
    SourceChanged,
    IoError,
    UserInterrupt,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::NotFound => NOT_FOUND,
            Self::SourceChanged => SOURCE_CHANGED,
            Self::IoError => IO_ERROR,
            Self::UserInterrupt => USER_INTERRUPT,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a tarstream error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    if error.is_not_found() {
        return ExitCode::NotFound;
    }
    match error {
        Error::Io(e) if e.kind() == std::io::ErrorKind::Interrupted => ExitCode::UserInterrupt,
        Error::Io(_) | Error::EntryIo { .. } => ExitCode::IoError,
        Error::EntryChanged { .. } => ExitCode::SourceChanged,
        Error::InvalidArchivePath(_)
        | Error::NameTooLong { .. }
        | Error::InvalidBufferSize
        | Error::InvalidDestination(_) => ExitCode::BadArgs,
        Error::AlreadyFinalized | Error::Misaligned { .. } => ExitCode::FatalError,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
