//! Download a few Cloudnet files, verifying their checksums.
//!
//! Run with `RUST_LOG=cloudnet_dl=debug` to see retries and reuse decisions.
//! Ctrl-C cancels the batch and keeps the files already downloaded.

use cloudnet_dl::{DownloadDescriptor, DownloadResult, DownloaderBuilder, Error};
use color_eyre::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const FILES: &[(&str, &str)] = &[
    (
        "https://cloudnet.fmi.fi/api/download/product/20240101_bucharest_classification.nc",
        "3f0d1ae9ac7b6bd37e5dbc5a3e3e32f7f05de0e0b0df4e6e8d3d0c6fbb1c1c3a",
    ),
    (
        "https://cloudnet.fmi.fi/api/download/raw/chm15k/20240101_bucharest_chm15k_000.nc",
        "9e107d9d372bb6826bd81d3542a419d6",
    ),
];

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let descriptors = FILES
        .iter()
        .map(|(url, checksum)| DownloadDescriptor::try_from(*url).map(|d| d.with_checksum(*checksum)))
        .collect::<Result<Vec<_>, Error>>()?;

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let downloader = DownloaderBuilder::new()
        .directory(PathBuf::from("downloads"))
        .concurrency_limit(4)
        .validate_checksum(true)
        .cancellation(token)
        .on_complete(|result| {
            if let DownloadResult::Failed(failure) = result {
                eprintln!("[Failed] {}: {}", failure.filename(), failure.error);
            }
        })
        .build()?;

    match downloader.download(&descriptors).await {
        Ok(paths) => println!("Downloaded {} files.", paths.len()),
        Err(Error::Cancelled { completed }) => {
            println!("Cancelled after {} files.", completed.len())
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
