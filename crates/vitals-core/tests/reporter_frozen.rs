//! Reporter behaviour against a frozen clock and fixed host facts.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use vitals_core::exposition::{Histogram, MetricFamily};
use vitals_core::host::{CpuTimes, HeapStats, ManualClock, ProcessFacts, StaticProbe};
use vitals_core::snapshot::{UNAVAILABLE_BYTES, UNAVAILABLE_SECONDS};
use vitals_core::{DeploymentTarget, HealthStatus, RuntimeStatusReporter, ServiceIdentity, StatusKind};

fn identity(target: DeploymentTarget) -> ServiceIdentity {
    ServiceIdentity::resolve(target, "vitals", "1.0.0", |_| None)
}

fn facts() -> ProcessFacts {
    ProcessFacts {
        pid: 4242,
        resident_bytes: Some(50_000_000),
        virtual_bytes: Some(900_000_000),
        heap: Some(HeapStats { live_bytes: 2_000_000, peak_bytes: 3_000_000 }),
        cpu: Some(CpuTimes { user_seconds: 1.25, system_seconds: 0.5 }),
    }
}

fn frozen(probe: StaticProbe) -> (Arc<ManualClock>, RuntimeStatusReporter) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
    let reporter = RuntimeStatusReporter::new(identity(DeploymentTarget::Generic), clock.clone(), Arc::new(probe));
    (clock, reporter)
}

#[test]
fn uptime_tracks_clock_since_construction() {
    let (clock, reporter) = frozen(StaticProbe::new(facts()));
    assert_eq!(reporter.snapshot(StatusKind::Health).uptime, 0.0);

    clock.advance(Duration::from_millis(2500));
    let a = reporter.snapshot(StatusKind::Health).uptime;
    clock.advance(Duration::from_secs(1));
    let b = reporter.snapshot(StatusKind::Health).uptime;

    assert_eq!(a, 2.5);
    assert_eq!(b, 3.5);
}

#[test]
fn uptime_is_close_to_wall_clock_with_system_clock() {
    let reporter = RuntimeStatusReporter::new(
        identity(DeploymentTarget::Generic),
        Arc::new(vitals_core::host::SystemClock),
        Arc::new(StaticProbe::new(facts())),
    );
    std::thread::sleep(Duration::from_millis(20));
    let first = reporter.snapshot(StatusKind::Health).uptime;
    let second = reporter.snapshot(StatusKind::Health).uptime;
    assert!(first >= 0.02);
    assert!(first < 5.0);
    assert!(second >= first);
}

#[test]
fn snapshot_status_per_kind() {
    let (_clock, reporter) = frozen(StaticProbe::new(facts()));
    assert_eq!(reporter.snapshot(StatusKind::Health).status, HealthStatus::Healthy);
    assert_eq!(reporter.snapshot(StatusKind::Info).status, HealthStatus::Healthy);
    assert_eq!(reporter.snapshot(StatusKind::Ready).status, HealthStatus::Ready);

    reporter.set_draining();
    assert_eq!(reporter.snapshot(StatusKind::Ready).status, HealthStatus::Degraded);
    assert_eq!(reporter.snapshot(StatusKind::Health).status, HealthStatus::Healthy);
}

#[test]
fn snapshot_carries_host_facts() {
    let (_clock, reporter) = frozen(StaticProbe::new(facts()));
    let snap = reporter.snapshot(StatusKind::Info);
    assert_eq!(snap.pid, 4242);
    assert_eq!(snap.memory.resident, 50_000_000);
    assert_eq!(snap.memory.heap_used, 2_000_000);
    assert_eq!(snap.memory.heap_total, 3_000_000);
    assert_eq!(snap.memory.external, 48_000_000);
    assert_eq!(snap.cpu.user_seconds, 1.25);
    assert_eq!(snap.version.arch, std::env::consts::ARCH);
    assert_eq!(snap.version.app_version, "1.0.0");
}

#[test]
fn unavailable_host_queries_become_sentinels() {
    let (_clock, reporter) = frozen(StaticProbe::unavailable(7));
    let snap = reporter.snapshot(StatusKind::Info);

    assert_eq!(snap.status, HealthStatus::Healthy);
    assert_eq!(snap.memory.resident, UNAVAILABLE_BYTES);
    assert_eq!(snap.memory.heap_used, UNAVAILABLE_BYTES);
    assert_eq!(snap.memory.external, UNAVAILABLE_BYTES);
    assert_eq!(snap.cpu.user_seconds, UNAVAILABLE_SECONDS);
    assert_eq!(snap.environment, "development");
    assert_eq!(snap.build.commit, "unknown");

    // Counters stay valid: the family is announced but carries no sample.
    let text = reporter.render_metrics(&[]);
    assert!(text.contains("# TYPE process_cpu_user_seconds_total counter\n"));
    assert!(!text.contains("process_cpu_user_seconds_total -"));
    assert!(!text.contains("process_resident_memory_bytes -1"));
}

#[test]
fn info_defaults_for_cloud_target() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
    let reporter = RuntimeStatusReporter::new(
        identity(DeploymentTarget::GcpCloudRun),
        clock,
        Arc::new(StaticProbe::unavailable(1)),
    );
    let snap = reporter.snapshot(StatusKind::Info);
    assert_eq!(snap.environment, "production");
    assert_eq!(snap.region.as_deref(), Some("asia-northeast1"));
    assert_eq!(snap.platform.as_deref(), Some("Google Cloud Run"));
}

#[test]
fn render_is_byte_identical_under_frozen_clock() {
    let (_clock, reporter) = frozen(StaticProbe::new(facts()));
    assert_eq!(reporter.render_metrics(&[]), reporter.render_metrics(&[]));
}

#[test]
fn render_changes_only_with_clock() {
    let (clock, reporter) = frozen(StaticProbe::new(facts()));
    let before = reporter.render_metrics(&[]);
    clock.advance(Duration::from_secs(10));
    let after = reporter.render_metrics(&[]);

    let diff: Vec<(&str, &str)> = before
        .lines()
        .zip(after.lines())
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(diff, vec![("process_uptime_seconds 0", "process_uptime_seconds 10")]);
}

#[test]
fn family_order_is_fixed_and_headers_precede_samples() {
    let (_clock, reporter) = frozen(StaticProbe::new(facts()));
    let text = reporter.render_metrics(&[]);

    let names: Vec<&str> = text
        .lines()
        .filter_map(|l| l.strip_prefix("# TYPE "))
        .map(|l| l.split(' ').next().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "process_cpu_user_seconds_total",
            "process_cpu_system_seconds_total",
            "process_resident_memory_bytes",
            "process_virtual_memory_bytes",
            "process_heap_used_bytes",
            "process_heap_total_bytes",
            "process_external_memory_bytes",
            "process_start_time_seconds",
            "process_uptime_seconds",
            "runtime_version_info",
            "app_build_info",
        ]
    );

    // Every family block starts with HELP immediately followed by TYPE.
    for block in text.split("\n\n") {
        let mut lines = block.lines();
        let help = lines.next().unwrap();
        let ty = lines.next().unwrap();
        assert!(help.starts_with("# HELP "), "block: {block}");
        assert!(ty.starts_with("# TYPE "), "block: {block}");
        let name = help.split(' ').nth(2).unwrap();
        assert_eq!(ty.split(' ').nth(2).unwrap(), name);
        for sample in lines {
            assert!(sample.starts_with(name), "sample {sample} outside family {name}");
        }
    }
}

#[test]
fn start_time_and_build_info() {
    let (_clock, reporter) = frozen(StaticProbe::new(facts()));
    let text = reporter.render_metrics(&[]);
    assert!(text.contains("process_start_time_seconds 1714564800\n"));
    assert!(text.contains(
        "app_build_info{branch=\"local\",build=\"local\",commit=\"unknown\",environment=\"development\",service=\"vitals\",version=\"1.0.0\"} 1\n"
    ));
    assert!(text.contains("process_cpu_user_seconds_total 1.25\n"));
}

#[test]
fn extra_families_follow_process_families() {
    let (_clock, reporter) = frozen(StaticProbe::new(facts()));

    let mut requests = MetricFamily::counter("http_requests_total", "The total number of HTTP requests.").unwrap();
    requests.push_counter([("method", "GET"), ("route", "/health"), ("status", "200")], 3.0).unwrap();
    let mut latency = MetricFamily::histogram("http_request_duration_seconds", "Latency.").unwrap();
    let hist = Histogram::from_observations(&[0.1, 0.5, 1.0], [0.01, 0.2, 3.0]).unwrap();
    latency.push_histogram([("method", "GET"), ("route", "/health")], &hist).unwrap();

    let text = reporter.render_metrics(&[requests, latency]);
    let build_pos = text.find("# TYPE app_build_info").unwrap();
    let req_pos = text.find("# TYPE http_requests_total counter").unwrap();
    let lat_pos = text.find("# TYPE http_request_duration_seconds histogram").unwrap();
    assert!(build_pos < req_pos && req_pos < lat_pos);

    // Bucket values never decrease and +Inf equals the count.
    let buckets: Vec<f64> = text
        .lines()
        .filter(|l| l.starts_with("http_request_duration_seconds_bucket"))
        .map(|l| l.rsplit(' ').next().unwrap().parse().unwrap())
        .collect();
    assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
    assert!(text.contains("http_request_duration_seconds_bucket{method=\"GET\",route=\"/health\",le=\"+Inf\"} 3\n"));
    assert!(text.contains("http_request_duration_seconds_count{method=\"GET\",route=\"/health\"} 3\n"));
}
