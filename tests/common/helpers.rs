use cloudnet_dl::{DownloadDescriptor, DownloaderBuilder, ProgressMode, RetryPolicy};

use md5::Md5;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

pub fn md5_hex(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

/// Retries without the production backoff delays.
pub fn fast_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::with_backoff(max_attempts, Duration::from_millis(1), Duration::from_millis(10))
}

/// A builder writing into `dir`, without progress display and with fast
/// retries.
pub fn test_builder(dir: &Path) -> DownloaderBuilder {
    DownloaderBuilder::new()
        .directory(dir.to_path_buf())
        .progress(ProgressMode::Never)
        .retry_policy(fast_retry_policy(3))
}

/// Descriptor pointing at `/files/{filename}` on the mock server.
pub fn descriptor(server: &MockServer, filename: &str) -> DownloadDescriptor {
    DownloadDescriptor::try_from(format!("{}/files/{}", server.uri(), filename).as_str())
        .expect("Failed to create descriptor")
}

/// Serve `content` at `/files/{filename}`.
pub async fn mount_file(server: &MockServer, filename: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{}", filename)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Answer `/files/{filename}` with `status`, for at most `times` requests when
/// given, taking precedence over [`mount_file`].
pub async fn mount_status(server: &MockServer, filename: &str, status: u16, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/files/{}", filename)))
        .respond_with(ResponseTemplate::new(status))
        .with_priority(1);
    let mock = match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    };
    mock.mount(server).await;
}

/// Number of requests the server received for `/files/{filename}`.
pub async fn requests_for(server: &MockServer, filename: &str) -> usize {
    let target = format!("/files/{}", filename);
    server
        .received_requests()
        .await
        .expect("Request recording is disabled")
        .iter()
        .filter(|r| r.url.path() == target)
        .count()
}

/// Files in `dir` whose name marks an unfinished transfer.
pub fn partial_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .expect("Failed to read directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".part"))
        .collect()
}

/// Asserts that a file has the expected size
pub fn assert_file_size(path: &Path, expected_size: u64) {
    let metadata = fs::metadata(path).expect("Failed to get file metadata");
    assert_eq!(
        metadata.len(),
        expected_size,
        "File size mismatch at path: {:?}",
        path
    );
}

/// How the raw server answers one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawReply {
    /// Headers and the full body.
    Complete,
    /// Headers and half the body, then the connection is closed.
    Truncated,
    /// Headers and half the body, then nothing for a long time.
    Stalled,
}

/// A bare HTTP/1.1 server answering every request with `body`, shaped by
/// `replies` per connection (in order, `Complete` once exhausted).
///
/// Returns the base URL and the number of connections served so far.
pub async fn serve_raw(body: Vec<u8>, replies: Vec<RawReply>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind raw server");
    let addr = listener.local_addr().expect("Raw server has no address");
    let served = Arc::new(AtomicUsize::new(0));

    let counter = served.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let reply = replies.get(n).copied().unwrap_or(RawReply::Complete);
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let mut request = Vec::new();
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let half = &body[..body.len() / 2];
                match reply {
                    RawReply::Complete => {
                        let _ = socket.write_all(&body).await;
                    }
                    RawReply::Truncated => {
                        let _ = socket.write_all(half).await;
                    }
                    RawReply::Stalled => {
                        let _ = socket.write_all(half).await;
                        let _ = socket.flush().await;
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), served)
}
