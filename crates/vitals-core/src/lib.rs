//! vitals core: runtime self-reporting primitives.
//!
//! This crate holds everything a status surface needs that is not HTTP: the
//! snapshot data model, validated metric families and their text encoding,
//! host probes behind traits, deployment identity, and the reporter tying them
//! together. It carries no server or async runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Host query failures degrade to sentinels; only construction-time validation
//! of metric names and samples surfaces as `VitalsError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod error;
pub mod exposition;
pub mod host;
pub mod identity;
pub mod reporter;
pub mod snapshot;

/// Shared result type.
pub use error::{Result, VitalsError};
pub use identity::{DeploymentTarget, ServiceIdentity};
pub use reporter::RuntimeStatusReporter;
pub use snapshot::{HealthStatus, StatusKind, StatusSnapshot};
