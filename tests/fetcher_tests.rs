//! Single-file transfer tests: broken and stalled bodies, progress accounting.

use cloudnet_dl::{
    create_http_client, DownloadDescriptor, DownloadResult, ErrorKind, Fetch, FetchError,
    FetchRequest, FileFetcher, HttpClientConfig, ProgressReporter, StyleOptions,
};

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

mod common;
use common::helpers::*;

const BODY_SIZE: usize = 64 * 1024;

fn fetcher(max_attempts: u32, read_timeout: Duration) -> FileFetcher {
    let client = create_http_client(HttpClientConfig::default()).unwrap();
    FileFetcher::new(client, fast_retry_policy(max_attempts), read_timeout)
}

async fn fetch_one(
    fetcher: &FileFetcher,
    descriptor: &DownloadDescriptor,
    dir: &Path,
    validate_checksum: bool,
    progress: &ProgressReporter,
) -> DownloadResult {
    let destination = dir.join(&descriptor.filename);
    let cancel = CancellationToken::new();
    fetcher
        .fetch(FetchRequest {
            file_id: 0,
            descriptor,
            destination: &destination,
            validate_checksum,
            progress,
            cancel: &cancel,
        })
        .await
}

fn raw_descriptor(base: &str, filename: &str) -> DownloadDescriptor {
    DownloadDescriptor::try_from(format!("{}/files/{}", base, filename).as_str()).unwrap()
}

#[tokio::test]
async fn test_broken_body_restarts_from_zero() {
    let dir = create_temp_dir();
    let body = create_test_content(BODY_SIZE);
    let (base, served) = serve_raw(body.clone(), vec![RawReply::Truncated, RawReply::Truncated]).await;
    let progress = ProgressReporter::new(true, &[Some(BODY_SIZE as u64)], &StyleOptions::default());

    let result = fetch_one(
        &fetcher(3, Duration::from_secs(5)),
        &raw_descriptor(&base, "broken.nc"),
        dir.path(),
        false,
        &progress,
    )
    .await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(result.attempts(), 3);
    assert_eq!(served.load(Ordering::SeqCst), 3);
    assert_eq!(std::fs::read(dir.path().join("broken.nc")).unwrap(), body);
    // Bytes of the broken attempts are not counted twice.
    assert_eq!(progress.position(), BODY_SIZE as u64);
    assert!(partial_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_broken_body_exhausts_retries() {
    let dir = create_temp_dir();
    let (base, served) = serve_raw(
        create_test_content(BODY_SIZE),
        vec![RawReply::Truncated; 2],
    )
    .await;
    let progress = ProgressReporter::new(true, &[Some(BODY_SIZE as u64)], &StyleOptions::default());

    let result = fetch_one(
        &fetcher(2, Duration::from_secs(5)),
        &raw_descriptor(&base, "broken.nc"),
        dir.path(),
        false,
        &progress,
    )
    .await;

    match result {
        DownloadResult::Failed(failure) => {
            assert_eq!(failure.kind(), ErrorKind::RetriesExhausted);
            assert_eq!(failure.attempts, 2);
            assert!(matches!(
                failure.error,
                FetchError::RetriesExhausted { ref last, .. } if matches!(**last, FetchError::Interrupted { .. })
            ));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(served.load(Ordering::SeqCst), 2);
    assert_eq!(progress.position(), 0);
    assert!(!dir.path().join("broken.nc").exists());
    assert!(partial_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    let dir = create_temp_dir();
    let (base, served) = serve_raw(create_test_content(BODY_SIZE), vec![RawReply::Stalled; 2]).await;

    let result = fetch_one(
        &fetcher(2, Duration::from_millis(200)),
        &raw_descriptor(&base, "stalled.nc"),
        dir.path(),
        false,
        &ProgressReporter::disabled(),
    )
    .await;

    match result {
        DownloadResult::Failed(failure) => {
            assert_eq!(failure.attempts, 2);
            assert!(matches!(
                failure.error,
                FetchError::RetriesExhausted { ref last, .. } if matches!(**last, FetchError::Timeout { .. })
            ));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(served.load(Ordering::SeqCst), 2);
    assert!(!dir.path().join("stalled.nc").exists());
    assert!(partial_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_stalled_body_recovers_on_retry() {
    let dir = create_temp_dir();
    let body = create_test_content(BODY_SIZE);
    let (base, _) = serve_raw(body.clone(), vec![RawReply::Stalled]).await;

    let result = fetch_one(
        &fetcher(3, Duration::from_millis(200)),
        &raw_descriptor(&base, "slow.nc"),
        dir.path(),
        false,
        &ProgressReporter::disabled(),
    )
    .await;

    assert!(result.is_success(), "{:?}", result);
    assert_eq!(result.attempts(), 2);
    assert_eq!(std::fs::read(dir.path().join("slow.nc")).unwrap(), body);
}

#[tokio::test]
async fn test_checksum_mismatch_rewinds_progress() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();
    let content = create_test_content(4096);
    mount_file(&server, "corrupt.nc", &content).await;
    let progress = ProgressReporter::new(true, &[Some(4096)], &StyleOptions::default());

    let result = fetch_one(
        &fetcher(3, Duration::from_secs(5)),
        &descriptor(&server, "corrupt.nc").with_checksum(sha256_hex(b"something else")),
        dir.path(),
        true,
        &progress,
    )
    .await;

    assert_eq!(result.error_kind(), Some(ErrorKind::ChecksumMismatch));
    assert_eq!(progress.position(), 0);
    assert!(partial_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_verified_file_keeps_progress() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();
    let content = create_test_content(4096);
    mount_file(&server, "good.nc", &content).await;
    let progress = ProgressReporter::new(true, &[Some(4096)], &StyleOptions::default());

    let result = fetch_one(
        &fetcher(3, Duration::from_secs(5)),
        &descriptor(&server, "good.nc").with_checksum(md5_hex(&content)),
        dir.path(),
        true,
        &progress,
    )
    .await;

    assert!(result.is_success());
    assert_eq!(progress.position(), 4096);
}
