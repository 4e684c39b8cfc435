use serde::Deserialize;
use vitals_core::error::{Result, VitalsError};
use vitals_core::DeploymentTarget;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub service: ServiceSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            service: ServiceSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VitalsError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.service.validate()?;

        Ok(())
    }

    /// Apply `PORT` on top of the configured listen address.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| {
                    VitalsError::BadRequest(format!("PORT must be a valid port number, got {port:?}"))
                })?;
            let host = self
                .server
                .listen
                .rsplit_once(':')
                .map(|(h, _)| h.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.server.listen = format!("{host}:{port}");
        }
        self.validate()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(VitalsError::BadRequest(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_message")]
    pub message: String,

    #[serde(default)]
    pub target: DeploymentTarget,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            message: default_message(),
            target: DeploymentTarget::default(),
        }
    }
}

impl ServiceSection {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VitalsError::BadRequest("service.name must not be empty".into()));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_name() -> String {
    "vitals".into()
}
fn default_message() -> String {
    "Hello from vitals!".into()
}
