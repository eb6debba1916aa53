//! Downloader module containing batch orchestration, builder pattern, and
//! configuration.
//!
//! The module is organized into four components:
//!
//! - `downloader` - the [`Downloader`] coordinating a batch
//! - `fetcher` - the [`Fetch`] seam and its HTTP implementation, [`FileFetcher`]
//! - `builder` - [`DownloaderBuilder`] for configuring a downloader
//! - `config` - [`DownloadOptions`] and callback types
//!
//! ```rust,no_run
//! use cloudnet_dl::{DownloadDescriptor, DownloaderBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = DownloaderBuilder::new().build()?;
//!
//! let descriptors = vec![
//!     DownloadDescriptor::try_from("https://cloudnet.fmi.fi/api/download/raw/a.LV1")?,
//!     DownloadDescriptor::try_from("https://cloudnet.fmi.fi/api/download/raw/b.LV1")?,
//! ];
//!
//! let results = downloader.download_results(&descriptors).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod downloader;
pub mod fetcher;

pub use builder::DownloaderBuilder;
pub use config::{DownloadCallback, DownloadOptions};
pub use downloader::Downloader;
pub use fetcher::{Fetch, FetchRequest, FileFetcher};
