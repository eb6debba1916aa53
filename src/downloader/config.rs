//! Configuration structures and defaults for the downloader.
//!
//! [`DownloadOptions`] gathers everything a batch call needs. It can be filled
//! directly and handed to [`crate::download`] / [`crate::download_async`], or
//! assembled through the [`crate::DownloaderBuilder`].
//!
//! ```rust
//! use cloudnet_dl::{DownloadOptions, ProgressMode};
//!
//! let options = DownloadOptions {
//!     output_directory: "data/bucharest".into(),
//!     concurrency_limit: 8,
//!     progress: ProgressMode::Never,
//!     validate_checksum: true,
//!     ..DownloadOptions::default()
//! };
//! ```

use crate::download::DownloadResult;
use crate::http::{HttpClientConfig, RetryPolicy};
use crate::progress::{ProgressMode, StyleOptions};

use std::env::current_dir;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Callback type for per-file completion events.
pub type DownloadCallback = Box<dyn Fn(&DownloadResult) + Send + Sync>;

/// Default number of concurrent transfers.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Default bound on waiting for response headers or for the next body chunk.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Options of a download batch.
#[derive(Clone)]
pub struct DownloadOptions {
    /// Directory where to store the downloaded files; created if absent.
    pub output_directory: PathBuf,
    /// Maximum number of in-flight transfers. Values below 1 count as 1.
    pub concurrency_limit: usize,
    /// Whether to display a progress indicator.
    pub progress: ProgressMode,
    /// Require and verify a checksum for every file.
    pub validate_checksum: bool,
    /// Fetch files even when an existing destination matches its checksum.
    pub overwrite: bool,
    /// Retry policy applied to every file.
    pub retry: RetryPolicy,
    /// Bound on waiting for response headers or for the next body chunk.
    pub read_timeout: Duration,
    /// HTTP client settings.
    pub http: HttpClientConfig,
    /// Progress indicator styles.
    pub style_options: StyleOptions,
    /// Callback invoked once per file with its result.
    pub on_complete: Option<Arc<DownloadCallback>>,
    /// Cancels the batch when triggered.
    pub cancellation: CancellationToken,
}

impl DownloadOptions {
    /// Options with defaults, writing into `output_directory`.
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
            ..Self::default()
        }
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency_limit.max(1)
    }
}

impl std::fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("output_directory", &self.output_directory)
            .field("concurrency_limit", &self.concurrency_limit)
            .field("progress", &self.progress)
            .field("validate_checksum", &self.validate_checksum)
            .field("overwrite", &self.overwrite)
            .field("retry", &self.retry)
            .field("read_timeout", &self.read_timeout)
            .field("http", &self.http)
            .field("style_options", &self.style_options)
            .field("on_complete", &self.on_complete.is_some())
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_directory: current_dir().unwrap_or_default(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            progress: ProgressMode::Auto,
            validate_checksum: false,
            overwrite: false,
            retry: RetryPolicy::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            http: HttpClientConfig::default(),
            style_options: StyleOptions::default(),
            on_complete: None,
            cancellation: CancellationToken::new(),
        }
    }
}
