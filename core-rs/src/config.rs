//! Environment defaults and option files
//!
//! `PORT` and `HOST` only fill in what the caller left unset. Option files
//! carry a serialized [`GetPortOptions`] in YAML or JSON.

use std::fs;
use std::path::Path;

use crate::errors::{PortError, Result};
use crate::port::GetPortOptions;

pub const PORT_ENV: &str = "PORT";
pub const HOST_ENV: &str = "HOST";

/// Fallback values read from the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub port: Option<u16>,
    pub host: Option<String>,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        Self::from_values(std::env::var(PORT_ENV).ok(), std::env::var(HOST_ENV).ok())
    }

    /// Unparseable ports and empty hosts are ignored
    pub fn from_values(port: Option<String>, host: Option<String>) -> Self {
        EnvDefaults {
            port: port.and_then(|p| p.trim().parse().ok()),
            host: host.filter(|h| !h.trim().is_empty()),
        }
    }
}

/// Load options from a `.yaml`, `.yml` or `.json` file
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<GetPortOptions> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        _ => Err(PortError::InvalidConfig(format!(
            "Unsupported options file (expected .yaml, .yml or .json): {}",
            path.display()
        ))),
    }
}
