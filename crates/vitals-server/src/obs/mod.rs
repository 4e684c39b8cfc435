//! In-process request metrics.
//!
//! Series are stored as atomics and turned into `MetricFamily` values by the
//! `/metrics` handler; encoding is left to `vitals_core::exposition`.

pub mod metrics;
pub mod track;

pub use metrics::RequestMetrics;
