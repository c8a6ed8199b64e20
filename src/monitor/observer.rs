//! Tick observers.

use super::MetricsTable;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Error type observers may return; it is logged and discarded.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Receives the metrics table once per completed tick.
///
/// Failures (returned errors or panics) are caught and logged by the monitor
/// and never stop the monitor loop.
pub trait QualityObserver: Send + Sync + 'static {
    fn on_quality_change(&self, table: &MetricsTable) -> Result<(), ObserverError>;
}

impl<F> QualityObserver for F
where
    F: Fn(&MetricsTable) -> Result<(), ObserverError> + Send + Sync + 'static,
{
    fn on_quality_change(&self, table: &MetricsTable) -> Result<(), ObserverError> {
        self(table)
    }
}

/// Invoke one observer, isolating the caller from its failures.
pub(crate) fn notify(observer: &dyn QualityObserver, table: &MetricsTable) {
    match catch_unwind(AssertUnwindSafe(|| observer.on_quality_change(table))) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::error!(tick = table.tick(), error = %error, "Quality observer failed");
        }
        Err(_) => {
            tracing::error!(tick = table.tick(), "Quality observer panicked");
        }
    }
}
