//! Progress bar styling and configuration options.
//!
//! The batch indicator uses one of two styles depending on its unit: a
//! byte-oriented one when every file size is known, and a file-count one
//! otherwise.
//!
//! ```rust
//! use cloudnet_dl::progress::{ProgressBarOpts, StyleOptions};
//!
//! let style_options = StyleOptions::new(
//!     ProgressBarOpts::with_pip_style(),
//!     ProgressBarOpts::new(
//!         Some("[{bar:40.cyan/blue}] {pos}/{len} files".to_string()),
//!         Some(ProgressBarOpts::CHARS_FINE.to_string()),
//!         false,
//!     ),
//! );
//! ```

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Define the batch indicator style options.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Style used when progress is measured in bytes.
    pub(crate) bytes: ProgressBarOpts,
    /// Style used when progress is measured in completed files.
    pub(crate) files: ProgressBarOpts,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            bytes: ProgressBarOpts::with_pip_style(),
            files: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_BAR_WITH_POSITION.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_FINE.into()),
                clear: false,
            },
        }
    }
}

impl StyleOptions {
    /// Create new [`StyleOptions`].
    pub fn new(bytes: ProgressBarOpts, files: ProgressBarOpts) -> Self {
        Self { bytes, files }
    }

    /// Set the options used for byte progress.
    pub fn set_bytes(&mut self, bytes: ProgressBarOpts) {
        self.bytes = bytes;
    }

    /// Set the options used for file-count progress.
    pub fn set_files(&mut self, files: ProgressBarOpts) {
        self.files = files;
    }

    /// Get a reference to the byte progress options.
    pub fn bytes(&self) -> &ProgressBarOpts {
        &self.bytes
    }

    /// Get a reference to the file-count progress options.
    pub fn files(&self) -> &ProgressBarOpts {
        &self.files
    }
}

/// Define the options for a progress bar.
#[derive(Debug, Clone, Default)]
pub struct ProgressBarOpts {
    /// Progress bar template string.
    template: Option<String>,
    /// Progression characters set.
    ///
    /// There must be at least 3 characters for the following states:
    /// "filled", "current", and "to do".
    progress_chars: Option<String>,
    /// Clear the progress bar once completed.
    pub(crate) clear: bool,
}

impl ProgressBarOpts {
    /// Template representing the bar and its position.
    ///
    ///`███████████████████████████████████████ 11/12 (99%) eta 00:00:02`
    pub const TEMPLATE_BAR_WITH_POSITION: &'static str =
        "{bar:40.blue} {pos:>}/{len} ({percent}%) eta {eta_precise:.blue}";
    /// Template which looks like the Python package installer pip.
    ///
    /// `━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━ 211.23 KiB/211.23 KiB 1008.31 KiB/s eta 0s`
    pub const TEMPLATE_PIP: &'static str =
        "{bar:40.green/black} {bytes:>11.green}/{total_bytes:<11.green} {bytes_per_sec:>13.red} eta {eta:.blue}";
    /// Use fade-in blocks as progress characters: `"█▓▒░  "`.
    pub const CHARS_FADE_IN: &'static str = "█▓▒░  ";
    /// Use fine blocks as progress characters: `"█▉▊▋▌▍▎▏  "`.
    pub const CHARS_FINE: &'static str = "█▉▊▋▌▍▎▏  ";
    /// Use a line as progress characters: `"━╾─"`.
    pub const CHARS_LINE: &'static str = "━╾╴─";

    /// Create a new [`ProgressBarOpts`].
    pub fn new(template: Option<String>, progress_chars: Option<String>, clear: bool) -> Self {
        Self {
            template,
            progress_chars,
            clear,
        }
    }

    /// Create a [`ProgressStyle`] based on the provided options.
    ///
    /// An invalid template falls back to the default bar style.
    pub fn to_progress_style(&self) -> ProgressStyle {
        let mut style = match self.template.as_deref() {
            Some(template) => {
                ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
            }
            None => ProgressStyle::default_bar(),
        };
        if let Some(progress_chars) = self.progress_chars.as_deref() {
            style = style.progress_chars(progress_chars);
        }
        style
    }

    /// Create a [`ProgressBar`] drawing to stderr.
    pub fn to_progress_bar(&self, len: u64) -> ProgressBar {
        ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr())
            .with_style(self.to_progress_style())
    }

    /// Create a new [`ProgressBarOpts`] which looks like Python pip.
    pub fn with_pip_style() -> Self {
        Self {
            template: Some(ProgressBarOpts::TEMPLATE_PIP.into()),
            progress_chars: Some(ProgressBarOpts::CHARS_LINE.into()),
            clear: false,
        }
    }

    /// Set to `true` to clear the progress bar upon completion.
    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles() {
        let style = StyleOptions::default();
        assert!(!style.bytes().clear);
        assert!(!style.files().clear);
    }

    #[test]
    fn test_invalid_template_falls_back() {
        let opts = ProgressBarOpts::new(Some("{bar:40.blue".into()), None, true);
        let pb = opts.to_progress_bar(10);
        assert_eq!(pb.length(), Some(10));
    }

    #[test]
    fn test_set_clear() {
        let mut opts = ProgressBarOpts::with_pip_style();
        opts.set_clear(true);
        assert!(opts.clear);
    }
}
