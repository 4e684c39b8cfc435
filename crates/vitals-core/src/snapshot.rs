//! Structured status snapshot served by the JSON endpoints.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::identity::BuildMetadata;

/// Sentinel for byte counts the host could not report.
pub const UNAVAILABLE_BYTES: i64 = -1;
/// Sentinel for CPU seconds the host could not report.
pub const UNAVAILABLE_SECONDS: f64 = -1.0;

/// What the caller is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Health,
    Ready,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Ready,
    Degraded,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Ready => "ready",
            HealthStatus::Degraded => "degraded",
        }
    }
}

/// Byte counts; `-1` means unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub heap_used: i64,
    pub heap_total: i64,
    #[serde(rename = "rss")]
    pub resident: i64,
    pub external: i64,
    #[serde(rename = "virtual")]
    pub virtual_size: i64,
}

/// Accumulated CPU seconds; `-1` means unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuUsage {
    pub user_seconds: f64,
    pub system_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Full compiler version string, e.g. `rustc 1.81.0 (eeb90cda1 2024-09-04)`.
    pub runtime: String,
    /// `major.minor.patch` of the compiler, or `unknown`.
    pub runtime_semver: String,
    pub app_version: String,
    pub platform: String,
    pub arch: String,
}

/// Immutable value captured at request time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: HealthStatus,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Seconds since the reporter was built.
    pub uptime: f64,
    pub memory: MemoryUsage,
    pub cpu: CpuUsage,
    pub version: VersionInfo,
    pub pid: u32,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub build: BuildMetadata,
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_matches_iso_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-09T07:05:01.000Z");
    }

    #[test]
    fn memory_uses_wire_keys() {
        let mem = MemoryUsage { heap_used: 1, heap_total: 2, resident: 3, external: 4, virtual_size: 5 };
        let v = serde_json::to_value(mem).unwrap();
        assert_eq!(v["heapUsed"], 1);
        assert_eq!(v["heapTotal"], 2);
        assert_eq!(v["rss"], 3);
        assert_eq!(v["external"], 4);
        assert_eq!(v["virtual"], 5);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(HealthStatus::Degraded).unwrap(), "degraded");
    }
}
