//! Pluggable reporter for non-fatal decode anomalies.
//!
//! The codec absorbs malformed fields instead of failing; this sink is how
//! those events become visible. Implementations are injected via
//! [`crate::codec::BudgetCodec::with_sink`].
use std::sync::Arc;

use tracing::error;

/// Reporter interface for decode anomalies.
pub trait AnomalySink: Send + Sync + 'static {
    /// Report a malformed field that decoding absorbed.
    fn error(&self, message: &str);
}

/// Shared handle to an anomaly sink.
pub type SinkHandle = Arc<dyn AnomalySink>;

/// Sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl AnomalySink for NoOpSink {
    #[inline(always)]
    fn error(&self, _: &str) {}
}

/// Sink that forwards reports to `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AnomalySink for TracingSink {
    fn error(&self, message: &str) {
        error!(target: "fuze", "{message}");
    }
}

/// Create a no-op sink handle.
#[inline]
pub fn noop_sink() -> SinkHandle {
    Arc::new(NoOpSink)
}

/// Create a sink handle backed by `tracing`.
#[inline]
pub fn tracing_sink() -> SinkHandle {
    Arc::new(TracingSink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpSink>(), 0);
    }

    #[test]
    fn noop_can_be_called_repeatedly() {
        let sink = NoOpSink;
        for _ in 0..100 {
            sink.error("ignored");
        }
    }
}
