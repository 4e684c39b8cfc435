//! Shared application state for the vitals server.
//!
//! - One `RuntimeStatusReporter` for the whole process, built here.
//! - Request metrics registry fed by the tracking middleware.
//! - Startup errors are explicit (Result instead of panic).

use std::sync::Arc;

use vitals_core::error::Result;
use vitals_core::exposition::MetricFamily;
use vitals_core::{RuntimeStatusReporter, ServiceIdentity};

use crate::config::ServerConfig;
use crate::obs::RequestMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    reporter: Arc<RuntimeStatusReporter>,
    metrics: Arc<RequestMetrics>,
}

struct AppStateInner {
    cfg: ServerConfig,
}

impl AppState {
    /// Build state over the real clock, process and environment.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        cfg.validate()?;
        let identity = ServiceIdentity::from_env(
            cfg.service.target,
            &cfg.service.name,
            env!("CARGO_PKG_VERSION"),
        );
        let reporter = RuntimeStatusReporter::with_host(identity);
        Ok(Self::with_reporter(cfg, reporter))
    }

    /// Build state around an already configured reporter (tests inject a
    /// frozen clock and fixed host facts this way).
    pub fn with_reporter(cfg: ServerConfig, reporter: RuntimeStatusReporter) -> Self {
        tracing::info!(
            service = %reporter.identity().service,
            target = %reporter.identity().target,
            environment = %reporter.identity().environment,
            "status reporter ready"
        );
        Self {
            inner: Arc::new(AppStateInner { cfg }),
            reporter: Arc::new(reporter),
            metrics: Arc::new(RequestMetrics::default()),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn reporter(&self) -> &RuntimeStatusReporter {
        &self.reporter
    }

    pub fn request_metrics(&self) -> &RequestMetrics {
        &self.metrics
    }

    /// Mark draining state (readiness reports `degraded` from now on).
    pub fn set_draining(&self) {
        self.reporter.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.reporter.is_draining()
    }

    /// Families appended after the process families on `/metrics`.
    pub fn metrics_extra(&self) -> Vec<MetricFamily> {
        let mut extra = self.metrics.families();
        match MetricFamily::gauge("vitals_draining", "1 while the server is shutting down.") {
            Ok(mut fam) => {
                let v = if self.is_draining() { 1.0 } else { 0.0 };
                if fam.push_gauge(std::iter::empty::<(&str, &str)>(), v).is_ok() {
                    extra.push(fam);
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping draining gauge"),
        }
        extra
    }
}
