//! Request metrics registry for the server.
//!
//! Counter/gauge/histogram vectors with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors; collection sorts series by
//! key so the exposition output is deterministic. Histogram state is kept in
//! integer microseconds and converted to seconds only when collected.

use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use vitals_core::exposition::{Histogram, MetricFamily};
use vitals_core::Result;

type LabelKey = Vec<(String, String)>;

fn key_of(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self.map.entry(key_of(labels)).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value of one series (0 when never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&key_of(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn collect(&self, name: &str, help: &str) -> Result<MetricFamily> {
        let mut series: Vec<(LabelKey, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        series.sort();

        let mut fam = MetricFamily::counter(name, help)?;
        for (key, val) in series {
            fam.push_counter(key, val as f64)?;
        }
        Ok(fam)
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self.map.entry(key_of(labels)).or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    fn collect(&self, name: &str, help: &str) -> Result<MetricFamily> {
        let mut series: Vec<(LabelKey, i64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        series.sort();

        let mut fam = MetricFamily::gauge(name, help)?;
        for (key, val) in series {
            fam.push_gauge(key, val as f64)?;
        }
        Ok(fam)
    }
}

// Default Prometheus latency buckets, in microseconds.
// 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const BUCKET_COUNT: usize = 11;
const BUCKETS_MICROS: [u64; BUCKET_COUNT] = [
    5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000, 5_000_000, 10_000_000,
];

/// Per-slot (non-cumulative) counts; the extra last slot holds observations
/// above every bound. Cumulative buckets and the total are derived on read,
/// so a concurrent scrape can never see decreasing buckets.
struct AtomicHistogram {
    sum_micros: AtomicU64,
    slots: [AtomicU64; BUCKET_COUNT + 1],
}

impl Default for AtomicHistogram {
    fn default() -> Self {
        Self {
            sum_micros: AtomicU64::new(0),
            slots: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

impl AtomicHistogram {
    fn observe(&self, micros: u64) {
        let slot = BUCKETS_MICROS
            .iter()
            .position(|&b| micros <= b)
            .unwrap_or(BUCKET_COUNT);
        self.slots[slot].fetch_add(1, Ordering::Relaxed);
        self.sum_micros.fetch_add(micros, Ordering::Relaxed);
    }

    fn snapshot(&self) -> Result<Histogram> {
        let mut cumulative = 0u64;
        let mut buckets = Vec::with_capacity(BUCKET_COUNT);
        for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
            cumulative += self.slots[i].load(Ordering::Relaxed);
            buckets.push((le as f64 / 1_000_000.0, cumulative));
        }
        let count = cumulative + self.slots[BUCKET_COUNT].load(Ordering::Relaxed);
        let sum = self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        Histogram::new(buckets, sum, count)
    }
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration (recorded at microsecond resolution).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self.map.entry(key_of(labels)).or_default();
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        hist.observe(micros);
    }

    fn collect(&self, name: &str, help: &str) -> Result<MetricFamily> {
        let mut series: Vec<(LabelKey, Histogram)> = Vec::with_capacity(self.map.len());
        for r in self.map.iter() {
            series.push((r.key().clone(), r.value().snapshot()?));
        }
        series.sort_by(|a, b| a.0.cmp(&b.0));

        let mut fam = MetricFamily::histogram(name, help)?;
        for (key, hist) in series {
            fam.push_histogram(key, &hist)?;
        }
        Ok(fam)
    }
}

#[derive(Default)]
pub struct RequestMetrics {
    pub requests: CounterVec,
    pub in_flight: GaugeVec,
    pub duration: HistogramVec,
}

impl RequestMetrics {
    /// Request families in their fixed order. Families are always present,
    /// even before any request has been recorded.
    pub fn families(&self) -> Vec<MetricFamily> {
        let mut out = Vec::with_capacity(3);
        let results = [
            self.requests.collect("http_requests_total", "The total number of HTTP requests."),
            self.in_flight.collect("http_requests_in_flight", "HTTP requests currently being served."),
            self.duration.collect("http_request_duration_seconds", "The HTTP request latencies in seconds."),
        ];
        for res in results {
            match res {
                Ok(fam) => out.push(fam),
                Err(e) => tracing::warn!(error = %e, "skipping request metric family"),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::exposition::encode;

    #[test]
    fn label_order_does_not_split_series() {
        let c = CounterVec::default();
        c.inc(&[("method", "GET"), ("route", "/")]);
        c.inc(&[("route", "/"), ("method", "GET")]);
        assert_eq!(c.get(&[("method", "GET"), ("route", "/")]), 2);
    }

    #[test]
    fn series_are_sorted_in_output() {
        let m = RequestMetrics::default();
        m.requests.inc(&[("route", "/ready")]);
        m.requests.inc(&[("route", "/health")]);
        m.requests.inc(&[("route", "/")]);

        let text = encode(&m.families());
        let routes: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("http_requests_total{"))
            .collect();
        assert_eq!(
            routes,
            vec![
                "http_requests_total{route=\"/\"} 1",
                "http_requests_total{route=\"/health\"} 1",
                "http_requests_total{route=\"/ready\"} 1",
            ]
        );
    }

    #[test]
    fn histogram_buckets_are_cumulative_in_seconds() {
        let h = HistogramVec::default();
        let labels = [("route", "/")];
        h.observe(&labels, Duration::from_millis(3));
        h.observe(&labels, Duration::from_millis(30));
        h.observe(&labels, Duration::from_secs(30));

        let fam = h.collect("lat_seconds", "Latency.").unwrap();
        let text = encode(&[fam]);
        assert!(text.contains("lat_seconds_bucket{route=\"/\",le=\"0.005\"} 1\n"));
        assert!(text.contains("lat_seconds_bucket{route=\"/\",le=\"0.025\"} 1\n"));
        assert!(text.contains("lat_seconds_bucket{route=\"/\",le=\"0.05\"} 2\n"));
        assert!(text.contains("lat_seconds_bucket{route=\"/\",le=\"10\"} 2\n"));
        assert!(text.contains("lat_seconds_bucket{route=\"/\",le=\"+Inf\"} 3\n"));
        assert!(text.contains("lat_seconds_count{route=\"/\"} 3\n"));
        assert!(text.contains("lat_seconds_sum{route=\"/\"} 30.033\n"));
    }

    #[test]
    fn empty_registry_still_announces_families() {
        let text = encode(&RequestMetrics::default().families());
        assert!(text.contains("# TYPE http_requests_total counter\n"));
        assert!(text.contains("# TYPE http_requests_in_flight gauge\n"));
        assert!(text.contains("# TYPE http_request_duration_seconds histogram\n"));
    }

    #[test]
    fn in_flight_gauge_goes_up_and_down() {
        let m = RequestMetrics::default();
        m.in_flight.inc(&[("route", "/")]);
        m.in_flight.inc(&[("route", "/")]);
        m.in_flight.dec(&[("route", "/")]);
        let text = encode(&m.families());
        assert!(text.contains("http_requests_in_flight{route=\"/\"} 1\n"));
    }
}
