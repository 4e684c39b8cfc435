//! Validated metric families.
//!
//! Every constructor and `push_*` method checks the exposition invariants up
//! front, so the encoder never has to:
//! - family names match `[a-zA-Z_:][a-zA-Z0-9_:]*`
//! - label names match `[a-zA-Z_][a-zA-Z0-9_]*` and never use the reserved `le`
//! - counter samples are finite and non-negative
//! - histogram buckets are cumulative and end in a `+Inf` bucket equal to the count

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, VitalsError};

/// Label set of one sample. `BTreeMap` keeps rendering order stable.
pub type Labels = BTreeMap<String, String>;

/// Label reserved for histogram bucket bounds.
const LE: &str = "le";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
    Histogram,
}

impl MetricKind {
    /// Token used on the `# TYPE` line.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag of a single sample line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleKind {
    Gauge,
    Counter,
    /// Cumulative bucket; `le` is `f64::INFINITY` for the `+Inf` bucket.
    Bucket { le: f64 },
    Sum,
    Count,
}

impl SampleKind {
    /// Suffix appended to the family name on the sample line.
    pub fn suffix(self) -> &'static str {
        match self {
            SampleKind::Gauge | SampleKind::Counter => "",
            SampleKind::Bucket { .. } => "_bucket",
            SampleKind::Sum => "_sum",
            SampleKind::Count => "_count",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub kind: SampleKind,
    pub labels: Labels,
    pub value: f64,
}

/// A named, typed group of samples sharing one HELP/TYPE header.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    name: String,
    help: String,
    kind: MetricKind,
    samples: Vec<MetricSample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, help: impl Into<String>, kind: MetricKind) -> Result<Self> {
        let name = name.into();
        if !is_valid_metric_name(&name) {
            return Err(VitalsError::InvalidMetricName(name));
        }
        Ok(Self {
            name,
            help: help.into(),
            kind,
            samples: Vec::new(),
        })
    }

    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> Result<Self> {
        Self::new(name, help, MetricKind::Gauge)
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> Result<Self> {
        Self::new(name, help, MetricKind::Counter)
    }

    pub fn histogram(name: impl Into<String>, help: impl Into<String>) -> Result<Self> {
        Self::new(name, help, MetricKind::Histogram)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    /// Append a gauge sample.
    pub fn push_gauge<I, K, V>(&mut self, labels: I, value: f64) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.expect_kind(MetricKind::Gauge)?;
        let labels = self.labels(labels)?;
        self.samples.push(MetricSample { kind: SampleKind::Gauge, labels, value });
        Ok(())
    }

    /// Append a counter sample. Negative or NaN values are rejected.
    pub fn push_counter<I, K, V>(&mut self, labels: I, value: f64) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.expect_kind(MetricKind::Counter)?;
        if value.is_nan() || value < 0.0 {
            return Err(VitalsError::NegativeCounter { metric: self.name.clone(), value });
        }
        let labels = self.labels(labels)?;
        self.samples.push(MetricSample { kind: SampleKind::Counter, labels, value });
        Ok(())
    }

    /// Append one histogram series: finite buckets, `+Inf`, `_sum`, `_count`.
    pub fn push_histogram<I, K, V>(&mut self, labels: I, hist: &Histogram) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.expect_kind(MetricKind::Histogram)?;
        let labels = self.labels(labels)?;

        for &(le, cumulative) in hist.buckets() {
            self.samples.push(MetricSample {
                kind: SampleKind::Bucket { le },
                labels: labels.clone(),
                value: cumulative as f64,
            });
        }
        self.samples.push(MetricSample {
            kind: SampleKind::Bucket { le: f64::INFINITY },
            labels: labels.clone(),
            value: hist.count() as f64,
        });
        self.samples.push(MetricSample {
            kind: SampleKind::Sum,
            labels: labels.clone(),
            value: hist.sum(),
        });
        self.samples.push(MetricSample {
            kind: SampleKind::Count,
            labels,
            value: hist.count() as f64,
        });
        Ok(())
    }

    fn expect_kind(&self, kind: MetricKind) -> Result<()> {
        if self.kind != kind {
            return Err(VitalsError::Internal(format!(
                "{kind} sample pushed to {} family {}",
                self.kind, self.name
            )));
        }
        Ok(())
    }

    fn labels<I, K, V>(&self, labels: I) -> Result<Labels>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut out = Labels::new();
        for (k, v) in labels {
            let k = k.into();
            if !is_valid_label_name(&k) || k == LE {
                return Err(VitalsError::InvalidLabelName { metric: self.name.clone(), label: k });
            }
            out.insert(k, v.into());
        }
        Ok(out)
    }
}

/// Cumulative histogram state ready for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    buckets: Vec<(f64, u64)>,
    sum: f64,
    count: u64,
}

impl Histogram {
    /// `buckets` holds `(upper_bound, cumulative_count)` pairs for the finite
    /// bounds only; the `+Inf` bucket is always derived from `count`.
    pub fn new(buckets: Vec<(f64, u64)>, sum: f64, count: u64) -> Result<Self> {
        let mut prev: Option<(f64, u64)> = None;
        for &(le, cumulative) in &buckets {
            if !le.is_finite() {
                return Err(VitalsError::InvalidHistogram(format!("bucket bound {le} is not finite")));
            }
            if let Some((prev_le, prev_count)) = prev {
                if le <= prev_le {
                    return Err(VitalsError::InvalidHistogram(format!(
                        "bucket bounds not increasing: {prev_le} then {le}"
                    )));
                }
                if cumulative < prev_count {
                    return Err(VitalsError::InvalidHistogram(format!(
                        "bucket counts decrease at le={le}: {prev_count} then {cumulative}"
                    )));
                }
            }
            if cumulative > count {
                return Err(VitalsError::InvalidHistogram(format!(
                    "bucket le={le} holds {cumulative} observations but count is {count}"
                )));
            }
            prev = Some((le, cumulative));
        }
        Ok(Self { buckets, sum, count })
    }

    /// Build from raw observations against fixed bounds.
    pub fn from_observations(
        bounds: &[f64],
        values: impl IntoIterator<Item = f64>,
    ) -> Result<Self> {
        let mut counts = vec![0u64; bounds.len()];
        let mut sum = 0.0;
        let mut count = 0u64;
        for v in values {
            sum += v;
            count += 1;
            for (i, &b) in bounds.iter().enumerate() {
                if v <= b {
                    counts[i] += 1;
                }
            }
        }
        Self::new(bounds.iter().copied().zip(counts).collect(), sum, count)
    }

    pub fn buckets(&self) -> &[(f64, u64)] {
        &self.buckets
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
