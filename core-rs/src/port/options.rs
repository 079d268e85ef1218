//! Caller options and their resolved form

use serde::{Deserialize, Serialize};

use super::host::{resolve_host, HostSpec};
use super::range::PortRange;
use crate::config::EnvDefaults;

/// Fallback range used when the caller pins nothing at all
pub const DEFAULT_ALTERNATIVE_RANGE: PortRange = PortRange { start: 3000, end: 3100 };

/// Options for a single `get_port` call. Every field is optional; unset
/// fields get their defaults in [`ResolutionOptions::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetPortOptions {
    /// Preferred port. 0 asks for a random port.
    pub port: Option<u16>,
    /// Extra candidates tried after `port`
    pub ports: Vec<u16>,
    pub port_range: Option<PortRange>,
    /// Tried when every primary candidate is taken. Use
    /// [`PortRange::empty`] to switch the fallback off.
    pub alternative_port_range: Option<PortRange>,
    /// `Some(false)` disables the random-port fallback
    pub random: Option<bool>,
    pub host: Option<String>,
    /// Bind on all interfaces when the hostname is unusable
    pub public: bool,
    pub verbose: bool,
    /// Shown in log lines only
    pub name: Option<String>,
}

impl GetPortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    pub fn port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range = Some(PortRange::new(start, end));
        self
    }

    pub fn alternative_port_range(mut self, start: u16, end: u16) -> Self {
        self.alternative_port_range = Some(PortRange::new(start, end));
        self
    }

    pub fn no_alternative_port_range(mut self) -> Self {
        self.alternative_port_range = Some(PortRange::empty());
        self
    }

    pub fn random(mut self, random: bool) -> Self {
        self.random = Some(random);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True when the caller pinned a port, a port list or a range
    pub fn specifies_any_port(&self) -> bool {
        self.port.is_some_and(|p| p != 0)
            || !self.ports.is_empty()
            || self.port_range.is_some_and(|r| !r.is_empty())
    }
}

impl From<u16> for GetPortOptions {
    fn from(port: u16) -> Self {
        GetPortOptions::new().port(port)
    }
}

/// Numeric shorthand: leading digits are the port, anything else means 0
impl From<&str> for GetPortOptions {
    fn from(value: &str) -> Self {
        let digits: String = value
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        GetPortOptions::new().port(digits.parse().unwrap_or(0))
    }
}

/// Fully defaulted options for one resolution request
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOptions {
    pub port: Option<u16>,
    pub ports: Vec<u16>,
    pub port_range: PortRange,
    pub alternative_port_range: PortRange,
    pub random: bool,
    /// Random fallback runs unless the caller said `random: false`
    pub random_fallback: bool,
    /// Caller pinned a port, list or range
    pub specified_any_port: bool,
    pub host: HostSpec,
    pub verbose: bool,
    pub name: String,
}

impl ResolutionOptions {
    pub fn resolve(options: &GetPortOptions, env: &EnvDefaults) -> Self {
        let port = options.port.or(env.port);
        let specified_any_port = options.specifies_any_port();

        let random = options.random.unwrap_or(port == Some(0));

        let alternative_port_range = match options.alternative_port_range {
            Some(range) => range,
            None if specified_any_port => PortRange::empty(),
            None => DEFAULT_ALTERNATIVE_RANGE,
        };

        let host = resolve_host(
            options.host.as_deref().or(env.host.as_deref()),
            options.public,
            options.verbose,
        );

        ResolutionOptions {
            port,
            ports: options.ports.clone(),
            port_range: options.port_range.unwrap_or_else(PortRange::empty),
            alternative_port_range,
            random,
            random_fallback: options.random != Some(false),
            specified_any_port,
            host,
            verbose: options.verbose,
            name: options.name.clone().unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// Primary-stage candidates, in probe order, before safe-port filtering
    pub fn primary_candidates(&self) -> Vec<u16> {
        let mut candidates = Vec::new();
        if !self.random {
            candidates.extend(self.port);
            candidates.extend(self.ports.iter().copied());
        }
        candidates.extend(self.port_range.generate(self.random));
        candidates
    }

    /// Summary of everything the cascade tried, for the exhaustion error
    pub fn tried_summary(&self) -> String {
        let mut tried: Vec<String> = Vec::new();
        if let Some(port) = self.port.filter(|p| *p != 0) {
            tried.push(port.to_string());
        }
        if !self.ports.is_empty() {
            let ports: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
            tried.push(ports.join(", "));
        }
        if !self.port_range.is_empty() {
            tried.push(self.port_range.to_string());
        }
        if !self.alternative_port_range.is_empty() {
            tried.push(self.alternative_port_range.to_string());
        }
        tried.join(", ")
    }
}
