//! Error handling for the cloudnet-dl library.
//!
//! Two layers of errors exist. [`FetchError`] describes why a single file
//! could not be materialized; it is captured per file and never aborts the
//! batch on its own. [`Error`] is what a batch call returns: either a
//! pre-flight failure raised before any transfer starts, or a verdict raised
//! once every scheduled file has reached a terminal state.

use crate::download::FileFailure;

use reqwest::StatusCode;
use std::fmt::Write;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can happen when running a download batch.
#[derive(Error, Debug)]
pub enum Error {
    /// Two descriptors of the same batch target the same destination file.
    ///
    /// Raised before any request is issued.
    #[error("duplicate destination filename {filename:?} in batch")]
    DuplicateDestination { filename: String },

    /// The output directory exists as something else than a directory, or
    /// cannot be created.
    ///
    /// Raised before any request is issued.
    #[error("destination {path:?} is unavailable: {reason}")]
    DestinationUnavailable {
        path: PathBuf,
        reason: String,
        source: Option<io::Error>,
    },

    /// One or more files ended in a failed state.
    ///
    /// Files listed in `completed` were materialized and are left on disk.
    #[error(
        "{} of {total} downloads failed:{}",
        .failures.len(),
        describe_failures(.failures)
    )]
    BatchIncomplete {
        total: usize,
        failures: Vec<FileFailure>,
        completed: Vec<PathBuf>,
    },

    /// The batch was cancelled by the caller before it could complete.
    ///
    /// Files listed in `completed` were materialized before the cancellation
    /// and are left on disk.
    #[error("download batch cancelled ({} files completed)", .completed.len())]
    Cancelled { completed: Vec<PathBuf> },

    /// Error from the underlying URL parser or the expected URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A descriptor's filename would place the file outside the output
    /// directory.
    ///
    /// Raised before any request is issued.
    #[error("filename {filename:?} is not a plain file name")]
    InvalidFilename { filename: String },

    /// The blocking entry point was called from within an async runtime.
    #[error("blocking download called from within an async runtime; use the async entry point")]
    NestedRuntime,

    /// The runtime backing the blocking entry point could not be started.
    #[error("failed to start the download runtime")]
    Runtime {
        #[source]
        source: io::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to build the HTTP client")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
}

impl Error {
    /// Paths that were successfully materialized before the batch failed.
    pub fn completed(&self) -> &[PathBuf] {
        match self {
            Error::BatchIncomplete { completed, .. } | Error::Cancelled { completed } => completed,
            _ => &[],
        }
    }

    /// Per-file failures carried by a [`Error::BatchIncomplete`].
    pub fn failures(&self) -> &[FileFailure] {
        match self {
            Error::BatchIncomplete { failures, .. } => failures,
            _ => &[],
        }
    }
}

fn describe_failures(failures: &[FileFailure]) -> String {
    let mut out = String::new();
    for failure in failures {
        let _ = write!(
            out,
            "\n  {}: {} (after {} attempt{})",
            failure.descriptor.filename,
            failure.error,
            failure.attempts,
            if failure.attempts == 1 { "" } else { "s" }
        );
    }
    out
}

/// Coarse classification of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network-level failure worth retrying (connection reset, timeout,
    /// 5xx, rate limiting).
    TransientTransport,
    /// Network-level failure that a retry would reproduce (4xx, invalid
    /// request).
    FatalTransport,
    /// Local filesystem failure.
    Filesystem,
    /// Checksum validation was requested but no usable expected value exists.
    ChecksumUnavailable,
    /// The computed digest differs from the expected one.
    ChecksumMismatch,
    /// The retry budget was spent on transient failures.
    RetriesExhausted,
    /// The batch was cancelled while this file was queued or in flight.
    Cancelled,
}

/// Reasons a single file could not be downloaded.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or no response headers were received.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        transient: bool,
        #[source]
        source: reqwest_middleware::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: StatusCode,
        transient: bool,
    },

    /// The body stream broke after the transfer started.
    #[error("transfer from {url} interrupted: {source}")]
    Interrupted {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// No data arrived within the read timeout.
    #[error("no data from {url} within {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Local file operation failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Checksum validation was requested for a descriptor without checksum.
    #[error("checksum validation requested but no checksum is published")]
    ChecksumUnavailable,

    /// The published checksum is not a digest format we can compute.
    #[error("unrecognized checksum {checksum:?}")]
    UnrecognizedChecksum { checksum: String },

    /// The downloaded content does not hash to the published checksum.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Transient failures persisted until the retry budget was spent.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    /// The batch was cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a new attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { transient, .. } | FetchError::Status { transient, .. } => {
                *transient
            }
            FetchError::Interrupted { .. } | FetchError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport { .. }
            | FetchError::Status { .. }
            | FetchError::Interrupted { .. }
            | FetchError::Timeout { .. } => {
                if self.is_transient() {
                    ErrorKind::TransientTransport
                } else {
                    ErrorKind::FatalTransport
                }
            }
            FetchError::Io { .. } => ErrorKind::Filesystem,
            FetchError::ChecksumUnavailable | FetchError::UnrecognizedChecksum { .. } => {
                ErrorKind::ChecksumUnavailable
            }
            FetchError::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            FetchError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            FetchError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Result type alias for operations that can fail with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
