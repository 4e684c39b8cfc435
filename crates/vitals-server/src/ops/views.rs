//! JSON bodies. Each is a projection of a `StatusSnapshot` or of the
//! service identity; all carry `status` and `timestamp`, except the root
//! banner and `/api/version`, which are not status documents.

use serde::Serialize;

use vitals_core::snapshot::{format_timestamp, CpuUsage, HealthStatus, MemoryUsage, StatusSnapshot};

#[derive(Debug, Serialize)]
pub struct RootBody {
    pub message: String,
    pub version: String,
    pub timestamp: String,
    pub environment: String,
    pub build: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: HealthStatus,
    pub timestamp: String,
    pub uptime: f64,
    pub memory: MemoryUsage,
    pub environment: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl From<StatusSnapshot> for HealthBody {
    fn from(s: StatusSnapshot) -> Self {
        Self {
            status: s.status,
            timestamp: format_timestamp(&s.timestamp),
            uptime: s.uptime,
            memory: s.memory,
            environment: s.environment,
            version: s.version.app_version,
            platform: s.platform,
            region: s.region,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadyBody {
    pub status: HealthStatus,
    pub timestamp: String,
    pub uptime: f64,
}

impl From<StatusSnapshot> for ReadyBody {
    fn from(s: StatusSnapshot) -> Self {
        Self {
            status: s.status,
            timestamp: format_timestamp(&s.timestamp),
            uptime: s.uptime,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoBody {
    pub status: HealthStatus,
    pub timestamp: String,
    pub runtime_version: String,
    pub platform: String,
    pub architecture: String,
    pub memory: MemoryUsage,
    pub cpu: CpuUsage,
    pub env: String,
    pub pid: u32,
    pub build: String,
    pub branch: String,
    pub commit: String,
}

impl From<StatusSnapshot> for InfoBody {
    fn from(s: StatusSnapshot) -> Self {
        Self {
            status: s.status,
            timestamp: format_timestamp(&s.timestamp),
            runtime_version: s.version.runtime,
            platform: s.version.platform,
            architecture: s.version.arch,
            memory: s.memory,
            cpu: s.cpu,
            env: s.environment,
            pid: s.pid,
            build: s.build.build_number,
            branch: s.build.branch,
            commit: s.build.commit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub service: String,
    pub status: &'static str,
    pub version: String,
    pub environment: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VersionBody {
    pub version: String,
    pub build: String,
    pub commit: String,
}
