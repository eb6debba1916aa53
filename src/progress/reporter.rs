//! Batch progress reporting.
//!
//! One [`ProgressReporter`] is created per batch call and shared by reference
//! with every fetch of that batch. Each file is identified by its position in
//! the batch. Counters are atomics, so concurrent fetches never contend on a
//! lock, and a disabled reporter holds nothing at all.

use super::style::StyleOptions;

use indicatif::{ProgressBar, ProgressDrawTarget};
use std::sync::atomic::{AtomicU64, Ordering};

/// Whether to display progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// Display progress when stderr is an interactive terminal.
    #[default]
    Auto,
    /// Always display progress.
    Always,
    /// Never display progress.
    Never,
}

impl ProgressMode {
    /// Resolve the mode against the current environment.
    pub fn resolve(self) -> bool {
        match self {
            ProgressMode::Auto => !ProgressDrawTarget::stderr().is_hidden(),
            ProgressMode::Always => true,
            ProgressMode::Never => false,
        }
    }
}

impl From<bool> for ProgressMode {
    fn from(enabled: bool) -> Self {
        if enabled {
            ProgressMode::Always
        } else {
            ProgressMode::Never
        }
    }
}

/// Unit the batch indicator counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    /// Bytes transferred, out of the sum of all expected sizes.
    Bytes,
    /// Files completed, out of the batch length.
    ///
    /// Used as soon as one file has an unknown size, since mixing bytes and
    /// estimates would be misleading.
    Files,
}

struct Tracker {
    bar: ProgressBar,
    unit: ProgressUnit,
    per_file: Vec<AtomicU64>,
    transferred: AtomicU64,
    clear: bool,
}

/// Aggregates per-file progress into a single indicator.
#[derive(Default)]
pub struct ProgressReporter {
    tracker: Option<Tracker>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("unit", &self.unit())
            .field("position", &self.position())
            .finish()
    }
}

impl ProgressReporter {
    /// A reporter on which every operation is a no-op.
    pub fn disabled() -> Self {
        Self { tracker: None }
    }

    /// Create a reporter for a batch whose files have the given expected
    /// sizes, in batch order.
    pub fn new(enabled: bool, sizes: &[Option<u64>], style_options: &StyleOptions) -> Self {
        if !enabled {
            return Self::disabled();
        }

        let known: Option<u64> = sizes.iter().copied().sum();
        let (unit, len, opts) = match known {
            Some(total) => (ProgressUnit::Bytes, total, style_options.bytes()),
            None => (ProgressUnit::Files, sizes.len() as u64, style_options.files()),
        };

        let bar = opts.to_progress_bar(len);
        bar.tick();

        Self {
            tracker: Some(Tracker {
                bar,
                unit,
                per_file: sizes.iter().map(|_| AtomicU64::new(0)).collect(),
                transferred: AtomicU64::new(0),
                clear: opts.clear,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tracker.is_some()
    }

    /// Unit of the indicator, `None` when disabled.
    pub fn unit(&self) -> Option<ProgressUnit> {
        self.tracker.as_ref().map(|t| t.unit)
    }

    /// Record `bytes_delta` new bytes for file `file_id`.
    pub fn update(&self, file_id: usize, bytes_delta: u64) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        if let Some(counter) = tracker.per_file.get(file_id) {
            counter.fetch_add(bytes_delta, Ordering::Relaxed);
        }
        let total = tracker.transferred.fetch_add(bytes_delta, Ordering::Relaxed) + bytes_delta;
        if tracker.unit == ProgressUnit::Bytes {
            tracker.bar.set_position(total);
        }
    }

    /// Forget the bytes recorded for file `file_id`, as its transfer restarts
    /// from zero.
    pub fn reset(&self, file_id: usize) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        let Some(counter) = tracker.per_file.get(file_id) else {
            return;
        };
        let recorded = counter.swap(0, Ordering::Relaxed);
        let total = tracker.transferred.fetch_sub(recorded, Ordering::Relaxed) - recorded;
        if tracker.unit == ProgressUnit::Bytes {
            tracker.bar.set_position(total);
        }
    }

    /// Mark file `file_id` as complete.
    pub fn complete(&self, _file_id: usize) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        if tracker.unit == ProgressUnit::Files {
            tracker.bar.inc(1);
        }
    }

    /// Current indicator position, 0 when disabled.
    pub fn position(&self) -> u64 {
        self.tracker.as_ref().map_or(0, |t| t.bar.position())
    }

    /// Indicator length, `None` when disabled.
    pub fn length(&self) -> Option<u64> {
        self.tracker.as_ref().and_then(|t| t.bar.length())
    }

    /// Finish the indicator, clearing it if configured to.
    pub fn finish(&self) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        if tracker.clear {
            tracker.bar.finish_and_clear();
        } else {
            tracker.bar.finish();
        }
    }
}
