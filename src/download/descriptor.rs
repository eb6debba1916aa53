//! Remote file descriptors.
//!
//! A [`DownloadDescriptor`] is the only thing the download core knows about a
//! catalog entry: where the bytes live, which name they get on disk, and what
//! they are expected to hash to.

use crate::error::Error;

use reqwest::Url;
use std::convert::TryFrom;

/// Represents a file to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDescriptor {
    /// URL of the file content.
    pub remote_url: Url,
    /// File name used to save the file on disk.
    pub filename: String,
    /// Published checksum (hex-encoded MD5 or SHA-256), if known.
    pub checksum: Option<String>,
    /// Expected payload size, used only for progress estimation.
    pub size_bytes: Option<u64>,
}

impl DownloadDescriptor {
    /// Creates a new [`DownloadDescriptor`].
    ///
    /// When using the [`DownloadDescriptor::try_from`] method, the file name
    /// is extracted from the URL instead.
    pub fn new(url: &Url, filename: &str) -> Self {
        Self {
            remote_url: url.clone(),
            filename: String::from(filename),
            checksum: None,
            size_bytes: None,
        }
    }

    /// Attach the published checksum.
    pub fn with_checksum(self, checksum: impl Into<String>) -> Self {
        Self {
            checksum: Some(checksum.into()),
            ..self
        }
    }

    /// Attach the expected payload size.
    pub fn with_size(self, size_bytes: u64) -> Self {
        Self {
            size_bytes: Some(size_bytes),
            ..self
        }
    }
}

impl TryFrom<&Url> for DownloadDescriptor {
    type Error = crate::error::Error;

    fn try_from(value: &Url) -> Result<Self, Self::Error> {
        let segment = value
            .path_segments()
            .ok_or_else(|| {
                Error::InvalidUrl(format!(
                    "The url \"{}\" does not contain a valid path",
                    value
                ))
            })?
            .next_back()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                Error::InvalidUrl(format!("The url \"{}\" does not contain a filename", value))
            })?;

        let filename = urlencoding::decode(segment).map_err(|e| {
            Error::InvalidUrl(format!("The url \"{}\" has an invalid filename: {}", value, e))
        })?;
        if !is_plain_filename(&filename) {
            return Err(Error::InvalidUrl(format!(
                "The url \"{}\" does not name a plain file: {:?}",
                value, filename
            )));
        }

        Ok(DownloadDescriptor::new(value, &filename))
    }
}

/// A name that stays inside the directory it is joined to.
pub(crate) fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

impl TryFrom<&str> for DownloadDescriptor {
    type Error = crate::error::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Url::parse(value)
            .map_err(|e| {
                Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", value, e))
            })
            .and_then(|u| DownloadDescriptor::try_from(&u))
    }
}
