//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ```rust
//! use cloudnet_dl::DownloaderBuilder;
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), cloudnet_dl::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .concurrency_limit(5)
//!     .retries(3)
//!     .validate_checksum(true)
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Per-file callbacks
//!
//! ```rust
//! use cloudnet_dl::{DownloadResult, DownloaderBuilder};
//!
//! # fn example() -> Result<(), cloudnet_dl::Error> {
//! let downloader = DownloaderBuilder::hidden()
//!     .on_complete(|result| match result {
//!         DownloadResult::Success { path, .. } => println!("Saved {}", path.display()),
//!         DownloadResult::Failed(failure) => {
//!             println!("Failed {}: {}", failure.filename(), failure.error)
//!         }
//!     })
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use super::config::DownloadOptions;
use super::downloader::Downloader;
use super::fetcher::Fetch;
use crate::download::DownloadResult;
use crate::error::Result;
use crate::http::RetryPolicy;
use crate::progress::{ProgressMode, StyleOptions};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Proxy;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

/// A builder used to create a [`Downloader`].
///
/// ```rust
/// # fn main() -> Result<(), cloudnet_dl::Error> {
/// use cloudnet_dl::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().retries(5).directory("downloads".into()).build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DownloaderBuilder {
    options: DownloadOptions,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Creates a builder from existing options.
    pub fn from_options(options: DownloadOptions) -> Self {
        Self { options }
    }

    /// Convenience function to hide the progress indicator.
    pub fn hidden() -> Self {
        DownloaderBuilder::default().progress(ProgressMode::Never)
    }

    /// Sets the directory where to store the downloads.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.options.output_directory = directory;
        self
    }

    /// Set the number of concurrent transfers.
    pub fn concurrency_limit(mut self, concurrency_limit: usize) -> Self {
        self.options.concurrency_limit = concurrency_limit;
        self
    }

    /// Set when to display the progress indicator.
    pub fn progress(mut self, progress: impl Into<ProgressMode>) -> Self {
        self.options.progress = progress.into();
        self
    }

    /// Require and verify a published checksum for every file.
    pub fn validate_checksum(mut self, validate_checksum: bool) -> Self {
        self.options.validate_checksum = validate_checksum;
        self
    }

    /// Set whether to fetch files whose existing copy already matches.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.options.overwrite = overwrite;
        self
    }

    /// Set the maximum number of attempts per file, keeping the default
    /// backoff.
    pub fn retries(mut self, max_attempts: u32) -> Self {
        self.options.retry = RetryPolicy::new(max_attempts);
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.options.retry = retry;
        self
    }

    /// Bound on waiting for response headers or for the next body chunk.
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.options.read_timeout = read_timeout;
        self
    }

    /// Bound on establishing a connection.
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.options.http.connect_timeout = connect_timeout;
        self
    }

    /// Route every request through `proxy`.
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.options.http.proxy = Some(proxy);
        self
    }

    /// Set the downloader style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.options.style_options = style_options;
        self
    }

    /// Set callback for when each file reaches a terminal state.
    ///
    /// The callback is called as soon as each file finishes, regardless of
    /// whether other files are still in progress.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DownloadResult) + Send + Sync + 'static,
    {
        self.options.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Use `token` to cancel the batch.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.options.cancellation = token;
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.options.http.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be
    /// merged into a single one.
    ///
    /// ```
    /// use reqwest::header::{self, HeaderMap, HeaderValue};
    /// use cloudnet_dl::DownloaderBuilder;
    ///
    /// let ua = HeaderValue::from_static("cloudnet-dl/0.1");
    ///
    /// let builder = DownloaderBuilder::new()
    ///     .headers(HeaderMap::from_iter([(header::USER_AGENT, ua)]));
    /// ```
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: DownloaderBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.options.http.headers = Some(new);
        self
    }

    /// Add the http header.
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use cloudnet_dl::DownloaderBuilder;
    ///
    /// let builder = DownloaderBuilder::new()
    ///     .header(header::USER_AGENT, HeaderValue::from_static("cloudnet-dl/0.1"))
    ///     .header(header::ACCEPT, HeaderValue::from_static("application/octet-stream"));
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.options.http.headers = Some(new);
        self
    }

    /// Get the options assembled so far.
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Create the [`Downloader`] with the specified options.
    pub fn build(self) -> Result<Downloader> {
        Downloader::new(self.options)
    }

    /// Create a [`Downloader`] that materializes files with `fetcher`.
    ///
    /// HTTP, retry and timeout options are left to the fetcher.
    pub fn build_with_fetcher<F: Fetch>(self, fetcher: F) -> Downloader<F> {
        Downloader::with_fetcher(self.options, fetcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT, USER_AGENT};

    #[test]
    fn test_builder_defaults() {
        let d = DownloaderBuilder::new().build().unwrap();
        assert_eq!(d.concurrency_limit(), 5);
        assert_eq!(d.options().retry.max_attempts(), 3);
        assert_eq!(d.options().progress, ProgressMode::Auto);
    }

    #[test]
    fn test_builder_setters() {
        let token = CancellationToken::new();
        let d = DownloaderBuilder::hidden()
            .directory("out".into())
            .concurrency_limit(12)
            .validate_checksum(true)
            .overwrite(true)
            .retries(7)
            .read_timeout(Duration::from_secs(2))
            .connect_timeout(Duration::from_secs(4))
            .cancellation(token.clone())
            .build()
            .unwrap();

        let options = d.options();
        assert_eq!(d.directory(), std::path::Path::new("out"));
        assert_eq!(d.concurrency_limit(), 12);
        assert_eq!(options.progress, ProgressMode::Never);
        assert!(options.validate_checksum);
        assert!(options.overwrite);
        assert_eq!(options.retry.max_attempts(), 7);
        assert_eq!(options.read_timeout, Duration::from_secs(2));
        assert_eq!(options.http.connect_timeout, Duration::from_secs(4));

        token.cancel();
        assert!(options.cancellation.is_cancelled());
    }

    #[test]
    fn test_progress_from_bool() {
        let builder = DownloaderBuilder::new().progress(true);
        assert_eq!(builder.options().progress, ProgressMode::Always);
    }

    #[test]
    fn test_headers_merge() {
        let mut first = HeaderMap::new();
        first.insert(USER_AGENT, HeaderValue::from_static("agent"));

        let builder = DownloaderBuilder::new()
            .headers(first)
            .header(ACCEPT, HeaderValue::from_static("*/*"));

        let headers = builder.options().http.headers.as_ref().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[USER_AGENT], "agent");
        assert_eq!(headers[ACCEPT], "*/*");
    }

    #[test]
    fn test_header_replaces_same_name() {
        let builder = DownloaderBuilder::new()
            .header(USER_AGENT, HeaderValue::from_static("one"))
            .header(USER_AGENT, HeaderValue::from_static("two"));

        let headers = builder.options().http.headers.as_ref().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[USER_AGENT], "two");
    }
}
