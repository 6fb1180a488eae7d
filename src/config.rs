use crate::types::{RegistrarError, Result};

pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_BASE_PATH: &str = "/resec/master";
pub const MEMBER_PREFIX: &str = "member_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrarConfig {
    /// Parent path for membership nodes
    pub base_path: String,
    /// Advertised datastore host
    pub host: String,
    pub port: u16,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_REDIS_PORT,
        }
    }
}

impl RegistrarConfig {
    pub fn new(base_path: impl Into<String>, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            base_path: base_path.into(),
            host: host.into(),
            port: port.unwrap_or(DEFAULT_REDIS_PORT),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let path = self.base_path.as_str();
        if !path.starts_with('/') {
            return Err(RegistrarError::InvalidConfig(format!(
                "base path must be absolute: {:?}",
                path
            )));
        }
        if path != "/" && path.ends_with('/') {
            return Err(RegistrarError::InvalidConfig(format!(
                "base path must not end with '/': {:?}",
                path
            )));
        }
        if path.contains("//") {
            return Err(RegistrarError::InvalidConfig(format!(
                "base path has an empty segment: {:?}",
                path
            )));
        }
        if self.host.trim().is_empty() {
            return Err(RegistrarError::InvalidConfig(
                "advertised host must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Prefix handed to the coordination service for sequential member nodes.
    pub fn member_prefix(&self) -> String {
        format!("{}/{}", self.base_path.trim_end_matches('/'), MEMBER_PREFIX)
    }
}
