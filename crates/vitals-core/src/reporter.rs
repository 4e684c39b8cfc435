//! Runtime status reporter.
//!
//! Built once at startup and shared behind `Arc`. After construction the only
//! state that ever changes is the draining flag; everything else is a pure
//! function of (start instant, clock reading, probe sample).
//!
//! Host queries that come back empty are replaced by sentinels (`-1`,
//! `"unknown"`) in snapshots and by sample-less families in the exposition
//! output. Nothing here returns an error to the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::exposition::{self, MetricFamily};
use crate::host::{Clock, HostProbe, ProcessFacts, SysinfoProbe, SystemClock};
use crate::identity::{ServiceIdentity, UNKNOWN};
use crate::snapshot::{
    CpuUsage, HealthStatus, MemoryUsage, StatusKind, StatusSnapshot, VersionInfo,
    UNAVAILABLE_BYTES, UNAVAILABLE_SECONDS,
};

/// Compiler version captured at build time.
pub const RUSTC_VERSION: &str = env!("VITALS_RUSTC_VERSION");

const NO_LABELS: [(&str, &str); 0] = [];

pub struct RuntimeStatusReporter {
    identity: ServiceIdentity,
    clock: Arc<dyn Clock>,
    probe: Arc<dyn HostProbe>,
    started_mono: Instant,
    started_utc: DateTime<Utc>,
    draining: AtomicBool,
}

impl RuntimeStatusReporter {
    pub fn new(
        identity: ServiceIdentity,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn HostProbe>,
    ) -> Self {
        let started_mono = clock.monotonic();
        let started_utc = clock.now_utc();
        Self {
            identity,
            clock,
            probe,
            started_mono,
            started_utc,
            draining: AtomicBool::new(false),
        }
    }

    /// Reporter over the real clock and process.
    pub fn with_host(identity: ServiceIdentity) -> Self {
        Self::new(identity, Arc::new(SystemClock), Arc::new(SysinfoProbe::new()))
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_utc
    }

    /// Current wall-clock time from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now_utc()
    }

    pub fn uptime(&self) -> Duration {
        self.clock.monotonic().saturating_duration_since(self.started_mono)
    }

    /// Mark draining state. Never cleared.
    pub fn set_draining(&self) {
        self.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, kind: StatusKind) -> StatusSnapshot {
        let facts = self.probe.sample();
        let status = match kind {
            StatusKind::Ready if self.is_draining() => HealthStatus::Degraded,
            StatusKind::Ready => HealthStatus::Ready,
            StatusKind::Health | StatusKind::Info => HealthStatus::Healthy,
        };

        StatusSnapshot {
            status,
            timestamp: self.clock.now_utc(),
            uptime: self.uptime().as_secs_f64(),
            memory: memory_usage(&facts),
            cpu: cpu_usage(&facts),
            version: self.version_info(),
            pid: facts.pid,
            environment: self.identity.environment.clone(),
            platform: self.identity.platform.clone(),
            region: self.identity.region.clone(),
            build: self.identity.build.clone(),
        }
    }

    fn version_info(&self) -> VersionInfo {
        VersionInfo {
            runtime: RUSTC_VERSION.to_string(),
            runtime_semver: runtime_semver(RUSTC_VERSION)
                .map(|(ma, mi, pa)| format!("{ma}.{mi}.{pa}"))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            app_version: self.identity.version.clone(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Process families in their fixed order.
    pub fn metric_families(&self) -> Vec<MetricFamily> {
        let facts = self.probe.sample();
        let mem = memory_usage(&facts);
        let cpu = facts.cpu;
        let known = |v: i64| (v != UNAVAILABLE_BYTES).then_some(v as f64);

        let mut out = Vec::with_capacity(11);
        let mut keep = |res: Result<MetricFamily>| match res {
            Ok(fam) => out.push(fam),
            Err(e) => tracing::warn!(error = %e, "skipping metric family"),
        };

        keep(counter(
            "process_cpu_user_seconds_total",
            "Total user CPU time spent in seconds.",
            cpu.map(|c| c.user_seconds),
        ));
        keep(counter(
            "process_cpu_system_seconds_total",
            "Total system CPU time spent in seconds.",
            cpu.map(|c| c.system_seconds),
        ));
        keep(gauge(
            "process_resident_memory_bytes",
            "Resident memory size in bytes.",
            known(mem.resident),
        ));
        keep(gauge(
            "process_virtual_memory_bytes",
            "Virtual memory size in bytes.",
            known(mem.virtual_size),
        ));
        keep(gauge(
            "process_heap_used_bytes",
            "Heap bytes currently allocated.",
            known(mem.heap_used),
        ));
        keep(gauge(
            "process_heap_total_bytes",
            "Peak heap bytes allocated since start.",
            known(mem.heap_total),
        ));
        keep(gauge(
            "process_external_memory_bytes",
            "Resident bytes not accounted for by the heap.",
            known(mem.external),
        ));
        keep(gauge(
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds.",
            Some(self.started_utc.timestamp_millis() as f64 / 1000.0),
        ));
        keep(gauge(
            "process_uptime_seconds",
            "Seconds since the process started.",
            Some(self.uptime().as_secs_f64()),
        ));
        keep(self.runtime_version_family());
        keep(self.build_info_family());

        out
    }

    fn runtime_version_family(&self) -> Result<MetricFamily> {
        let mut fam = MetricFamily::gauge("runtime_version_info", "Rust compiler version info.")?;
        let (version, major, minor, patch) = match runtime_semver(RUSTC_VERSION) {
            Some((ma, mi, pa)) => {
                (format!("{ma}.{mi}.{pa}"), ma.to_string(), mi.to_string(), pa.to_string())
            }
            None => (UNKNOWN.into(), UNKNOWN.into(), UNKNOWN.into(), UNKNOWN.into()),
        };
        fam.push_gauge(
            [("version", version), ("major", major), ("minor", minor), ("patch", patch)],
            1.0,
        )?;
        Ok(fam)
    }

    fn build_info_family(&self) -> Result<MetricFamily> {
        let id = &self.identity;
        let mut fam = MetricFamily::gauge("app_build_info", "Build and deployment identifiers.")?;
        fam.push_gauge(
            [
                ("branch", id.build.branch.as_str()),
                ("build", id.build.build_number.as_str()),
                ("commit", id.build.commit.as_str()),
                ("environment", id.environment.as_str()),
                ("service", id.service.as_str()),
                ("version", id.version.as_str()),
            ],
            1.0,
        )?;
        Ok(fam)
    }

    /// Process families followed by `extra`, in text exposition format.
    pub fn render_metrics(&self, extra: &[MetricFamily]) -> String {
        let mut families = self.metric_families();
        families.extend_from_slice(extra);
        exposition::encode(&families)
    }
}

fn gauge(name: &str, help: &str, value: Option<f64>) -> Result<MetricFamily> {
    let mut fam = MetricFamily::gauge(name, help)?;
    if let Some(v) = value {
        fam.push_gauge(NO_LABELS, v)?;
    }
    Ok(fam)
}

fn counter(name: &str, help: &str, value: Option<f64>) -> Result<MetricFamily> {
    let mut fam = MetricFamily::counter(name, help)?;
    if let Some(v) = value {
        fam.push_counter(NO_LABELS, v)?;
    }
    Ok(fam)
}

fn or_sentinel(v: Option<u64>, what: &'static str) -> i64 {
    match v {
        Some(v) => i64::try_from(v).unwrap_or(i64::MAX),
        None => {
            tracing::debug!(fact = what, "host query unavailable; using sentinel");
            UNAVAILABLE_BYTES
        }
    }
}

fn memory_usage(facts: &ProcessFacts) -> MemoryUsage {
    let resident = or_sentinel(facts.resident_bytes, "resident");
    let heap_used = or_sentinel(facts.heap.map(|h| h.live_bytes), "heap_used");
    let heap_total = or_sentinel(facts.heap.map(|h| h.peak_bytes), "heap_total");
    let external = match (facts.resident_bytes, facts.heap) {
        (Some(rss), Some(heap)) => {
            or_sentinel(Some(rss.saturating_sub(heap.live_bytes)), "external")
        }
        _ => UNAVAILABLE_BYTES,
    };
    MemoryUsage {
        heap_used,
        heap_total,
        resident,
        external,
        virtual_size: or_sentinel(facts.virtual_bytes, "virtual"),
    }
}

fn cpu_usage(facts: &ProcessFacts) -> CpuUsage {
    match facts.cpu {
        Some(c) => CpuUsage { user_seconds: c.user_seconds, system_seconds: c.system_seconds },
        None => {
            tracing::debug!(fact = "cpu", "host query unavailable; using sentinel");
            CpuUsage { user_seconds: UNAVAILABLE_SECONDS, system_seconds: UNAVAILABLE_SECONDS }
        }
    }
}

/// `rustc 1.81.0 (eeb90cda1 2024-09-04)` -> `(1, 81, 0)`. Pre-release tags are dropped.
fn runtime_semver(full: &str) -> Option<(u64, u64, u64)> {
    let token = full.split_whitespace().nth(1)?;
    let core = token.split('-').next()?;
    let mut parts = core.split('.').map(|p| p.parse::<u64>().ok());
    let major = parts.next()??;
    let minor = parts.next()??;
    let patch = parts.next()??;
    Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semver_from_rustc_banner() {
        assert_eq!(runtime_semver("rustc 1.81.0 (eeb90cda1 2024-09-04)"), Some((1, 81, 0)));
        assert_eq!(runtime_semver("rustc 1.84.0-nightly (abc 2024-10-01)"), Some((1, 84, 0)));
        assert_eq!(runtime_semver("unknown"), None);
        assert_eq!(runtime_semver("rustc x.y"), None);
    }

    #[test]
    fn external_is_resident_minus_heap() {
        use crate::host::HeapStats;
        let facts = ProcessFacts {
            pid: 1,
            resident_bytes: Some(1000),
            virtual_bytes: None,
            heap: Some(HeapStats { live_bytes: 400, peak_bytes: 900 }),
            cpu: None,
        };
        let mem = memory_usage(&facts);
        assert_eq!(mem.external, 600);
        assert_eq!(mem.heap_total, 900);
        assert_eq!(mem.virtual_size, UNAVAILABLE_BYTES);
    }
}
