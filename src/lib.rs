//! cloudnet-dl materializes files of the Cloudnet data portal on disk.
//!
//! Given a batch of [`DownloadDescriptor`]s, typically built from the
//! catalog's file metadata, it fetches every file over HTTP(S) under a
//! concurrency bound, retries transient failures, verifies checksums on
//! request, and reports progress on a single indicator.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cloudnet_dl::{DownloadDescriptor, DownloadOptions, Error};
//!
//! # fn main() -> Result<(), Error> {
//! let descriptor = DownloadDescriptor::try_from(
//!     "https://cloudnet.fmi.fi/api/download/product/20240101_bucharest_classification.nc",
//! )?
//! .with_checksum("a5c2fd4b1e2bd3bb5b5f4bd6bfbf36f1bdb6bd3fd17d0a5dd7b5a4ca6a2f17b9")
//! .with_size(1_048_576);
//!
//! let options = DownloadOptions {
//!     validate_checksum: true,
//!     ..DownloadOptions::new("output")
//! };
//! let paths = cloudnet_dl::download(&[descriptor], options)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - descriptors, checksums and per-file results
//! - [`downloader`] - the [`Downloader`], its builder and the [`Fetch`] seam
//! - [`error`] - batch and per-file errors
//! - [`http`] - HTTP client construction and retry policy
//! - [`progress`] - the batch progress indicator

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;

pub use download::{Checksum, ChecksumAlgorithm, DownloadDescriptor, DownloadResult, FileFailure};
pub use downloader::{
    DownloadCallback, DownloadOptions, Downloader, DownloaderBuilder, Fetch, FetchRequest,
    FileFetcher,
};
pub use error::{Error, ErrorKind, FetchError, Result};
pub use http::{create_http_client, HttpClientConfig, RetryDecision, RetryPolicy};
pub use progress::{ProgressBarOpts, ProgressMode, ProgressReporter, ProgressUnit, StyleOptions};

use std::path::PathBuf;

/// Download a batch, blocking the calling thread until every file reached a
/// terminal state.
///
/// Must not be called from within an async runtime; use [`download_async`]
/// there.
pub fn download(descriptors: &[DownloadDescriptor], options: DownloadOptions) -> Result<Vec<PathBuf>> {
    Downloader::new(options)?.download_blocking(descriptors)
}

/// Download a batch, suspending cooperatively on the caller's runtime.
///
/// Results and errors are the same as with [`download`].
pub async fn download_async(
    descriptors: &[DownloadDescriptor],
    options: DownloadOptions,
) -> Result<Vec<PathBuf>> {
    Downloader::new(options)?.download(descriptors).await
}
