//! Row-level progress reporting. The runner emits one event per completed row;
//! the console layer consumes them through a sink.

use std::sync::Arc;

/// One progress update: rows done so far, total rows, and the final score of
/// the row that just completed.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
    pub final_score: f64,
}

/// Sink for progress events. Implementations may throttle.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
