//! Single-file transfers.
//!
//! A fetch streams the response body to a temporary file created next to the
//! destination, verifies it if asked to, and atomically renames it to the
//! destination name. The temporary file is deleted whenever the fetch does
//! not complete, including when its future is dropped, so a partial file is
//! never visible under the public name.
//!
//! A failed attempt is handed to the [`RetryPolicy`]; a retried transfer
//! restarts from zero and reuses the same temporary file.

use crate::download::checksum::{digest_file, Checksum};
use crate::download::{DownloadDescriptor, DownloadResult};
use crate::error::FetchError;
use crate::http::retry::{classify_failure, classify_response, RetryDecision, RetryPolicy};
use crate::progress::ProgressReporter;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::{fs::File, io::AsyncWriteExt, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything a fetch needs to know about one file of a batch.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Position of the file in the batch.
    pub file_id: usize,
    pub descriptor: &'a DownloadDescriptor,
    /// Final path of the file.
    pub destination: &'a Path,
    pub validate_checksum: bool,
    pub progress: &'a ProgressReporter,
    pub cancel: &'a CancellationToken,
}

/// Materializes one file.
///
/// Implementations must report every outcome through the returned
/// [`DownloadResult`] rather than panicking, and must stop promptly once
/// `request.cancel` is triggered.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: FetchRequest<'_>) -> DownloadResult;
}

/// HTTP implementation of [`Fetch`].
#[derive(Clone)]
pub struct FileFetcher {
    client: ClientWithMiddleware,
    retry: RetryPolicy,
    read_timeout: Duration,
}

impl fmt::Debug for FileFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileFetcher")
            .field("retry", &self.retry)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

impl FileFetcher {
    pub fn new(client: ClientWithMiddleware, retry: RetryPolicy, read_timeout: Duration) -> Self {
        Self {
            client,
            retry,
            read_timeout,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn timed_out(&self, url: &str) -> FetchError {
        FetchError::Timeout {
            url: url.to_string(),
            timeout: self.read_timeout,
        }
    }

    /// One transfer attempt into `part`, returning the number of bytes written.
    async fn attempt(
        &self,
        request: &FetchRequest<'_>,
        part: &NamedTempFile,
    ) -> Result<u64, FetchError> {
        let url = request.descriptor.remote_url.as_str();
        debug!("Fetching {}", url);

        let response = match timeout(self.read_timeout, self.client.get(url).send()).await {
            Err(_) => return Err(self.timed_out(url)),
            Ok(Err(source)) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    transient: classify_failure(&source),
                    source,
                })
            }
            Ok(Ok(response)) => response,
        };

        if let Some(transient) = classify_response(&response) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
                transient,
            });
        }

        let mut file = part
            .reopen()
            .map(File::from_std)
            .map_err(|e| FetchError::io(part.path(), e))?;
        file.set_len(0)
            .await
            .map_err(|e| FetchError::io(part.path(), e))?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(item) = timeout(self.read_timeout, stream.next())
            .await
            .map_err(|_| self.timed_out(url))?
        {
            let mut chunk = item.map_err(|source| FetchError::Interrupted {
                url: url.to_string(),
                source,
            })?;
            let chunk_size = chunk.len() as u64;
            file.write_all_buf(&mut chunk)
                .await
                .map_err(|e| FetchError::io(part.path(), e))?;
            written += chunk_size;
            request.progress.update(request.file_id, chunk_size);
        }
        file.flush()
            .await
            .map_err(|e| FetchError::io(part.path(), e))?;

        Ok(written)
    }
}

#[async_trait]
impl Fetch for FileFetcher {
    async fn fetch(&self, request: FetchRequest<'_>) -> DownloadResult {
        let descriptor = request.descriptor;

        let expected = if request.validate_checksum {
            let Some(published) = descriptor.checksum.as_deref() else {
                warn!("No checksum published for {}", descriptor.filename);
                return DownloadResult::failed(descriptor, FetchError::ChecksumUnavailable, 0);
            };
            match Checksum::parse(published) {
                Ok(checksum) => Some(checksum),
                Err(e) => return DownloadResult::failed(descriptor, e, 0),
            }
        } else {
            None
        };

        let directory = request.destination.parent().unwrap_or_else(|| Path::new("."));
        let part = match tempfile::Builder::new()
            .prefix(&format!(".{}.", descriptor.filename))
            .suffix(".part")
            .tempfile_in(directory)
        {
            Ok(part) => part,
            Err(e) => return DownloadResult::failed(descriptor, FetchError::io(directory, e), 0),
        };

        let mut attempts = 0;
        let bytes_written = loop {
            attempts += 1;
            let outcome = tokio::select! {
                biased;
                _ = request.cancel.cancelled() => Err(FetchError::Cancelled),
                outcome = self.attempt(&request, &part) => outcome,
            };
            let error = match outcome {
                Ok(bytes) => break bytes,
                Err(error) => error,
            };

            request.progress.reset(request.file_id);
            if matches!(error, FetchError::Cancelled) {
                debug!("Cancelled {}", descriptor.filename);
                return DownloadResult::failed(descriptor, error, attempts);
            }

            match self.retry.decide(&error, attempts) {
                RetryDecision::Retry { after } => {
                    warn!(
                        "Attempt {} for {} failed, retrying in {:?}: {}",
                        attempts, descriptor.filename, after, error
                    );
                    tokio::select! {
                        biased;
                        _ = request.cancel.cancelled() => {
                            return DownloadResult::failed(descriptor, FetchError::Cancelled, attempts);
                        }
                        _ = tokio::time::sleep(after) => {}
                    }
                }
                RetryDecision::GiveUp => {
                    let error = if error.is_transient() {
                        FetchError::RetriesExhausted {
                            attempts,
                            last: Box::new(error),
                        }
                    } else {
                        error
                    };
                    return DownloadResult::failed(descriptor, error, attempts);
                }
            }
        };

        if let Some(checksum) = expected {
            let digest = tokio::select! {
                biased;
                _ = request.cancel.cancelled() => Err(FetchError::Cancelled),
                digest = digest_file(part.path(), checksum.algorithm()) => {
                    digest.map_err(|e| FetchError::io(part.path(), e))
                }
            };
            let error = match digest {
                Ok(actual) if checksum.matches(&actual) => None,
                Ok(actual) => Some(FetchError::ChecksumMismatch {
                    expected: checksum.expected().to_string(),
                    actual,
                }),
                Err(error) => Some(error),
            };
            if let Some(error) = error {
                request.progress.reset(request.file_id);
                return DownloadResult::failed(descriptor, error, attempts);
            }
            debug!("Checksum verified for {}", descriptor.filename);
        }

        if let Err(e) = part.persist(request.destination) {
            request.progress.reset(request.file_id);
            return DownloadResult::failed(
                descriptor,
                FetchError::io(request.destination, e.error),
                attempts,
            );
        }

        info!("Downloaded: {}", request.destination.display());
        DownloadResult::Success {
            path: request.destination.to_path_buf(),
            bytes_written,
            attempts,
        }
    }
}
