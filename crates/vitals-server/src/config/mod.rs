//! Server config loader (strict parsing).
//!
//! The file is optional; a missing file means every section takes its
//! defaults. Environment overrides (`PORT`) are applied after parsing.

pub mod schema;

use std::{fs, io, path::Path};

use vitals_core::error::{Result, VitalsError};

pub use schema::{ServerConfig, ServerSection, ServiceSection};

/// Config path used when `VITALS_CONFIG` is unset.
pub const DEFAULT_PATH: &str = "vitals.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ServerConfig> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file; using defaults");
            Ok(ServerConfig::default())
        }
        Err(e) => Err(VitalsError::Internal(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| VitalsError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load from `VITALS_CONFIG` (or [`DEFAULT_PATH`]) and apply environment overrides.
pub fn load_from_env() -> Result<ServerConfig> {
    let path = std::env::var("VITALS_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
    let mut cfg = load_from_file(&path)?;
    cfg.apply_env(|k| std::env::var(k).ok())?;
    Ok(cfg)
}
