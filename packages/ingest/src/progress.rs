//! Progress of loading an export row by row and of rendering one pie
//! chart per year.
//!
//! Loaders and renderers accept an optional [`ProgressCallback`]; passing
//! `None` reports to [`NullProgress`].

use std::sync::Arc;

/// Receives row or chart counts from a running stage.
pub trait ProgressCallback: Send + Sync {
    /// Announces how many rows or charts the stage will produce.
    fn set_total(&self, total: u64);

    /// Counts `delta` more rows or charts as done.
    fn inc(&self, delta: u64);

    /// Names what is being processed, such as the current chart year.
    fn set_message(&self, msg: String);

    /// Ends the stage with a closing summary such as the row count.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Shared [`NullProgress`], the fallback when a caller passes no reporter.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
