//! Download data model.
//!
//! This module holds the records flowing through a batch: the
//! [`DownloadDescriptor`] supplied by the catalog query layer, the per-file
//! [`DownloadResult`], and the [`checksum`] support used to verify content.
//!
//! - [`descriptor`] - Remote file descriptors and filename derivation
//! - [`result`] - Per-file outcomes
//! - [`checksum`] - Digest computation and comparison
//!
//! # Examples
//!
//! ```rust
//! use cloudnet_dl::download::DownloadDescriptor;
//!
//! let descriptor = DownloadDescriptor::try_from(
//!     "https://cloudnet.fmi.fi/api/download/product/20250801_bucharest_classification.nc",
//! )?
//! .with_checksum("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
//! .with_size(1024);
//! assert_eq!(descriptor.filename, "20250801_bucharest_classification.nc");
//! # Ok::<(), cloudnet_dl::Error>(())
//! ```

pub mod checksum;
pub mod descriptor;
pub mod result;

pub use checksum::{Checksum, ChecksumAlgorithm};
pub use descriptor::DownloadDescriptor;
pub use result::{DownloadResult, FileFailure};
