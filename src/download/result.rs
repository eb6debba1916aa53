//! Per-file download outcomes.

use super::descriptor::DownloadDescriptor;
use crate::error::{ErrorKind, FetchError};

use std::path::{Path, PathBuf};

/// Terminal state of one file of a batch.
#[derive(Debug)]
pub enum DownloadResult {
    /// The file is materialized at `path`.
    ///
    /// `attempts` is 0 when an existing file with a matching checksum was
    /// reused without any request.
    Success {
        path: PathBuf,
        bytes_written: u64,
        attempts: u32,
    },
    /// The file could not be materialized.
    Failed(FileFailure),
}

impl DownloadResult {
    pub(crate) fn failed(descriptor: &DownloadDescriptor, error: FetchError, attempts: u32) -> Self {
        DownloadResult::Failed(FileFailure {
            descriptor: descriptor.clone(),
            error,
            attempts,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadResult::Success { .. })
    }

    /// Local path of a successful download.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DownloadResult::Success { path, .. } => Some(path),
            DownloadResult::Failed(_) => None,
        }
    }

    /// Number of transfer attempts made for this file.
    pub fn attempts(&self) -> u32 {
        match self {
            DownloadResult::Success { attempts, .. } => *attempts,
            DownloadResult::Failed(failure) => failure.attempts,
        }
    }

    /// Classification of the failure, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            DownloadResult::Success { .. } => None,
            DownloadResult::Failed(failure) => Some(failure.kind()),
        }
    }
}

/// A file that ended in a failed state.
#[derive(Debug)]
pub struct FileFailure {
    /// The descriptor that failed.
    pub descriptor: DownloadDescriptor,
    /// Last error observed for this file.
    pub error: FetchError,
    /// Number of transfer attempts made.
    pub attempts: u32,
}

impl FileFailure {
    pub fn filename(&self) -> &str {
        &self.descriptor.filename
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn descriptor() -> DownloadDescriptor {
        let url = Url::parse("http://example.com/test.nc").unwrap();
        DownloadDescriptor::new(&url, "test.nc")
    }

    #[test]
    fn test_success_accessors() {
        let result = DownloadResult::Success {
            path: PathBuf::from("out/test.nc"),
            bytes_written: 1024,
            attempts: 2,
        };
        assert!(result.is_success());
        assert_eq!(result.path(), Some(Path::new("out/test.nc")));
        assert_eq!(result.attempts(), 2);
        assert_eq!(result.error_kind(), None);
    }

    #[test]
    fn test_failed_accessors() {
        let result = DownloadResult::failed(&descriptor(), FetchError::ChecksumUnavailable, 0);
        assert!(!result.is_success());
        assert_eq!(result.path(), None);
        assert_eq!(result.attempts(), 0);
        assert_eq!(result.error_kind(), Some(ErrorKind::ChecksumUnavailable));

        match result {
            DownloadResult::Failed(failure) => assert_eq!(failure.filename(), "test.nc"),
            _ => panic!("Expected Failed result"),
        }
    }
}
