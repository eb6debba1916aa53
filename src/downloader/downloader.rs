//! Batch orchestration.
//!
//! The [`Downloader`] validates a batch, prepares the output directory, fans
//! out one fetch per descriptor under the concurrency limit, and turns the
//! collected per-file results into a single verdict. Every scheduled file
//! runs to a terminal state before the verdict is decided; files already
//! written stay on disk whatever the verdict.
//!
//! ```rust,no_run
//! use cloudnet_dl::{DownloadDescriptor, DownloaderBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DownloaderBuilder::new()
//!     .directory("data".into())
//!     .concurrency_limit(10)
//!     .build()?;
//! let descriptors = vec![
//!     DownloadDescriptor::try_from("https://cloudnet.fmi.fi/api/download/product/a.nc")?,
//!     DownloadDescriptor::try_from("https://cloudnet.fmi.fi/api/download/product/b.nc")?,
//! ];
//!
//! let paths = downloader.download(&descriptors).await?;
//! # Ok(())
//! # }
//! ```

use super::config::DownloadOptions;
use super::fetcher::{Fetch, FetchRequest, FileFetcher};
use crate::download::checksum::Checksum;
use crate::download::descriptor::is_plain_filename;
use crate::download::{DownloadDescriptor, DownloadResult};
use crate::error::{Error, ErrorKind, FetchError, Result};
use crate::http::create_http_client;
use crate::progress::ProgressReporter;

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Represents the download controller.
///
/// A downloader can be created via its builder:
///
/// ```rust
/// # fn main() -> Result<(), cloudnet_dl::Error> {
/// use cloudnet_dl::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Downloader<F = FileFetcher> {
    options: DownloadOptions,
    fetcher: F,
}

impl<F: fmt::Debug> fmt::Debug for Downloader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("options", &self.options)
            .field("fetcher", &self.fetcher)
            .finish()
    }
}

impl Downloader<FileFetcher> {
    /// Creates a new Downloader fetching over HTTP.
    pub fn new(options: DownloadOptions) -> Result<Self> {
        let client = create_http_client(options.http.clone())?;
        let fetcher = FileFetcher::new(client, options.retry.clone(), options.read_timeout);
        Ok(Self { options, fetcher })
    }
}

impl<F: Fetch> Downloader<F> {
    /// Creates a new Downloader using a custom fetcher.
    pub fn with_fetcher(options: DownloadOptions, fetcher: F) -> Self {
        Self { options, fetcher }
    }

    /// Gets the batch options.
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Gets the directory where files will be downloaded.
    pub fn directory(&self) -> &Path {
        &self.options.output_directory
    }

    /// Gets the number of concurrent downloads.
    pub fn concurrency_limit(&self) -> usize {
        self.options.effective_concurrency()
    }

    /// Gets the fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Downloads the batch, suspending cooperatively.
    ///
    /// Returns the local paths in input order when every file succeeded.
    pub async fn download(&self, descriptors: &[DownloadDescriptor]) -> Result<Vec<PathBuf>> {
        let results = self.download_results(descriptors).await?;
        self.verdict(results)
    }

    /// Downloads the batch, blocking the calling thread.
    ///
    /// Runs the same batch as [`Downloader::download`] on a dedicated
    /// runtime. Called from within an async runtime, it returns
    /// [`Error::NestedRuntime`] instead.
    pub fn download_blocking(&self, descriptors: &[DownloadDescriptor]) -> Result<Vec<PathBuf>> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::NestedRuntime);
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|source| Error::Runtime { source })?;
        runtime.block_on(self.download(descriptors))
    }

    /// Downloads the batch and returns every per-file result, in input order.
    ///
    /// Only pre-flight failures are reported as errors.
    pub async fn download_results(
        &self,
        descriptors: &[DownloadDescriptor],
    ) -> Result<Vec<DownloadResult>> {
        check_unique_destinations(descriptors)?;
        self.prepare_directory().await?;

        let sizes: Vec<Option<u64>> = descriptors.iter().map(|d| d.size_bytes).collect();
        let progress = ProgressReporter::new(
            self.options.progress.resolve(),
            &sizes,
            &self.options.style_options,
        );

        debug!(
            "Downloading {} files into {:?} with {} concurrent transfers",
            descriptors.len(),
            self.options.output_directory,
            self.concurrency_limit()
        );

        let mut results = stream::iter(descriptors.iter().enumerate())
            .map(|(file_id, descriptor)| self.process(file_id, descriptor, &progress))
            .buffer_unordered(self.concurrency_limit())
            .collect::<Vec<_>>()
            .await;

        progress.finish();

        results.sort_by_key(|(file_id, _)| *file_id);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }

    /// Runs one descriptor to a terminal state.
    async fn process(
        &self,
        file_id: usize,
        descriptor: &DownloadDescriptor,
        progress: &ProgressReporter,
    ) -> (usize, DownloadResult) {
        let destination = self.options.output_directory.join(&descriptor.filename);
        let cancel = &self.options.cancellation;

        let result = if cancel.is_cancelled() {
            DownloadResult::failed(descriptor, FetchError::Cancelled, 0)
        } else if let Some(existing) = self.reuse_existing(descriptor, &destination).await {
            existing
        } else {
            self.fetcher
                .fetch(FetchRequest {
                    file_id,
                    descriptor,
                    destination: &destination,
                    validate_checksum: self.options.validate_checksum,
                    progress,
                    cancel,
                })
                .await
        };

        match &result {
            DownloadResult::Success { bytes_written, attempts, .. } => {
                if *attempts == 0 {
                    progress.update(file_id, *bytes_written);
                }
                progress.complete(file_id);
            }
            DownloadResult::Failed(failure) if failure.kind() != ErrorKind::Cancelled => {
                warn!("Failed to download {}: {}", failure.filename(), failure.error);
            }
            DownloadResult::Failed(_) => {}
        }

        if let Some(ref callback) = self.options.on_complete {
            callback(&result);
        }

        (file_id, result)
    }

    /// Reuse a destination file that already matches the published checksum.
    async fn reuse_existing(
        &self,
        descriptor: &DownloadDescriptor,
        destination: &Path,
    ) -> Option<DownloadResult> {
        if self.options.overwrite {
            return None;
        }
        let checksum = Checksum::parse(descriptor.checksum.as_deref()?).ok()?;
        let metadata = fs::metadata(destination).await.ok()?;
        if !metadata.is_file() {
            return None;
        }

        match checksum.verify(destination).await {
            Ok(true) => {
                info!("Already downloaded: {}", destination.display());
                Some(DownloadResult::Success {
                    path: destination.to_path_buf(),
                    bytes_written: metadata.len(),
                    attempts: 0,
                })
            }
            Ok(false) => {
                debug!("Checksum of existing {} differs, fetching again", destination.display());
                None
            }
            Err(e) => {
                debug!("Cannot hash existing {}: {}", destination.display(), e);
                None
            }
        }
    }

    /// Ensure the output directory exists.
    async fn prepare_directory(&self) -> Result<()> {
        let path = &self.options.output_directory;
        match fs::metadata(path).await {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(Error::DestinationUnavailable {
                    path: path.clone(),
                    reason: "exists and is not a directory".into(),
                    source: None,
                })
            }
            Err(_) => {}
        }

        debug!("Creating destination directory {:?}", path);
        fs::create_dir_all(path)
            .await
            .map_err(|e| Error::DestinationUnavailable {
                path: path.clone(),
                reason: e.to_string(),
                source: Some(e),
            })
    }

    /// Turn per-file results into the batch verdict.
    fn verdict(&self, results: Vec<DownloadResult>) -> Result<Vec<PathBuf>> {
        let total = results.len();
        let mut completed = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for result in results {
            match result {
                DownloadResult::Success { path, .. } => completed.push(path),
                DownloadResult::Failed(failure) => failures.push(failure),
            }
        }

        if self.options.cancellation.is_cancelled()
            && failures.iter().any(|f| f.kind() == ErrorKind::Cancelled)
        {
            return Err(Error::Cancelled { completed });
        }
        if !failures.is_empty() {
            return Err(Error::BatchIncomplete {
                total,
                failures,
                completed,
            });
        }
        Ok(completed)
    }
}

/// Reject batches where a filename leaves the output directory or two
/// descriptors share a destination filename.
fn check_unique_destinations(descriptors: &[DownloadDescriptor]) -> Result<()> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if !is_plain_filename(&descriptor.filename) {
            return Err(Error::InvalidFilename {
                filename: descriptor.filename.clone(),
            });
        }
        if !seen.insert(descriptor.filename.as_str()) {
            return Err(Error::DuplicateDestination {
                filename: descriptor.filename.clone(),
            });
        }
    }
    Ok(())
}
