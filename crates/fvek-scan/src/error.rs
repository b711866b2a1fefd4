//! Error types for allocation enumeration, profile checks and key dumping.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised around the detection engine. The engine itself never fails.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The memory image could not be read.
    #[error("failed to read memory image {path}: {source}")]
    ImageRead {
        /// Image path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The OS profile predates the drivers this tool knows how to scan.
    #[error("unsupported OS profile {0}: version 6.0 or later is required")]
    UnsupportedProfile(crate::source::OsVersion),

    /// An OS version string was not of the form `major.minor`.
    #[error("invalid OS version {0:?}: expected MAJOR.MINOR")]
    InvalidVersion(String),

    /// A pool tag was not exactly four ASCII bytes.
    #[error("invalid pool tag {0:?}: expected four ASCII characters")]
    InvalidPoolTag(String),

    /// Writing a recovered key to disk failed.
    #[error("failed to dump key to {path}: {source}")]
    Dump {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for results carrying [`ScanError`].
pub type Result<T> = std::result::Result<T, ScanError>;
