//! Progress reporting for a download batch.
//!
//! A single indicator aggregates every file of the batch:
//!
//! - [`reporter`] - The [`ProgressReporter`] shared by all fetches of one call
//! - [`style`] - Progress bar templates and characters
//!
//! The indicator counts bytes when every descriptor carries a size, and
//! completed files otherwise.

pub mod reporter;
pub mod style;

pub use reporter::{ProgressMode, ProgressReporter, ProgressUnit};
pub use style::{ProgressBarOpts, StyleOptions};
