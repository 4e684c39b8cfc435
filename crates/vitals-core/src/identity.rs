//! Deployment identity resolved once at startup from environment defaults.
//!
//! Resolution goes through a lookup closure rather than `std::env` directly so
//! tests can pass an empty or fixed environment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VitalsError;

/// Sentinel for identifiers the environment did not supply.
pub const UNKNOWN: &str = "unknown";

/// Where the service runs; selects label defaults and the JSON key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentTarget {
    #[default]
    Generic,
    AwsEcs,
    GcpCloudRun,
}

impl DeploymentTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentTarget::Generic => "generic",
            DeploymentTarget::AwsEcs => "aws_ecs",
            DeploymentTarget::GcpCloudRun => "gcp_cloud_run",
        }
    }

    fn default_environment(self) -> &'static str {
        match self {
            DeploymentTarget::GcpCloudRun => "production",
            _ => "development",
        }
    }

    fn platform_label(self) -> Option<&'static str> {
        match self {
            DeploymentTarget::Generic => None,
            DeploymentTarget::AwsEcs => Some("AWS ECS"),
            DeploymentTarget::GcpCloudRun => Some("Google Cloud Run"),
        }
    }

    /// (env var, default) for the region label.
    fn region_source(self) -> Option<(&'static str, &'static str)> {
        match self {
            DeploymentTarget::Generic => None,
            DeploymentTarget::AwsEcs => Some(("AWS_REGION", "ap-northeast-2")),
            DeploymentTarget::GcpCloudRun => Some(("GOOGLE_CLOUD_REGION", "asia-northeast1")),
        }
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentTarget {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(DeploymentTarget::Generic),
            "aws_ecs" => Ok(DeploymentTarget::AwsEcs),
            "gcp_cloud_run" => Ok(DeploymentTarget::GcpCloudRun),
            other => Err(VitalsError::BadRequest(format!("unknown deployment target: {other}"))),
        }
    }
}

/// Commit/branch/build identifiers, each defaulted to a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    pub commit: String,
    pub branch: String,
    pub build_number: String,
}

impl Default for BuildMetadata {
    fn default() -> Self {
        Self {
            commit: UNKNOWN.to_string(),
            branch: "local".to_string(),
            build_number: "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub service: String,
    pub target: DeploymentTarget,
    pub environment: String,
    pub version: String,
    pub platform: Option<String>,
    pub region: Option<String>,
    pub build: BuildMetadata,
}

impl ServiceIdentity {
    /// Resolve labels for `target`. `default_version` is used when
    /// `APP_VERSION` is unset; empty variables count as unset.
    pub fn resolve<F>(
        target: DeploymentTarget,
        service: &str,
        default_version: &str,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(*k));

        let environment = first(&["APP_ENV", "NODE_ENV"])
            .unwrap_or_else(|| target.default_environment().to_string());
        let version = get("APP_VERSION").unwrap_or_else(|| default_version.to_string());
        let region = target
            .region_source()
            .map(|(key, default)| get(key).unwrap_or_else(|| default.to_string()));

        let defaults = BuildMetadata::default();
        let build = BuildMetadata {
            commit: first(&["COMMIT_SHA", "GITHUB_SHA"]).unwrap_or(defaults.commit),
            branch: get("GITHUB_REF").unwrap_or(defaults.branch),
            build_number: get("BUILD_NUMBER").unwrap_or(defaults.build_number),
        };

        Self {
            service: service.to_string(),
            target,
            environment,
            version,
            platform: target.platform_label().map(str::to_string),
            region,
            build,
        }
    }

    /// Resolve against the real process environment.
    pub fn from_env(target: DeploymentTarget, service: &str, default_version: &str) -> Self {
        Self::resolve(target, service, default_version, |k| std::env::var(k).ok())
    }
}
