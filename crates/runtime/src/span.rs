use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStatus {
    Ok,
    Error,
    /// Dropped without an explicit finish (early return or unwinding).
    Aborted,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Ok => "ok",
            SpanStatus::Error => "error",
            SpanStatus::Aborted => "aborted",
        }
    }
}

/// Scoped timer: logs `span_start` on creation and exactly one `span_end`
/// with a duration, either from [`SpanTimer::finish`] or from `Drop`.
#[derive(Debug)]
pub struct SpanTimer {
    name: &'static str,
    trace_id: String,
    started: Instant,
    finished: bool,
}

impl SpanTimer {
    pub fn start(name: &'static str, trace_id: &str) -> Self {
        info!(trace_id, span = name, "span_start");
        Self {
            name,
            trace_id: trace_id.to_string(),
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn finish(mut self, status: SpanStatus) -> Duration {
        self.finished = true;
        self.record(status)
    }

    fn record(&self, status: SpanStatus) -> Duration {
        let elapsed = self.started.elapsed();
        info!(
            trace_id = %self.trace_id,
            span = self.name,
            duration_ms = elapsed.as_millis() as u64,
            status = status.as_str(),
            "span_end"
        );
        elapsed
    }
}

impl Drop for SpanTimer {
    fn drop(&mut self) {
        if !self.finished {
            self.record(SpanStatus::Aborted);
        }
    }
}
