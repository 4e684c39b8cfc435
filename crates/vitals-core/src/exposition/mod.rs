//! Metric families and their Prometheus text encoding.
//!
//! Producers (process metrics, request metrics) build validated
//! [`MetricFamily`] values; [`text::encode`] is the only path that turns them
//! into bytes. Another wire format can be added next to `text` without
//! touching the producers.

pub mod family;
pub mod text;

pub use family::{Histogram, Labels, MetricFamily, MetricKind, MetricSample, SampleKind};
pub use text::{encode, encode_into, CONTENT_TYPE};
