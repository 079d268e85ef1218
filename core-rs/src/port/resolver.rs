/**
 * resolver.rs
 * Port resolution cascade
 *
 * Stages, each attempted only when the previous one found nothing:
 * 1. Random shortcut: random requested and no port/list/range pinned
 * 2. Primary: requested port, extra ports, primary range
 * 3. Alternative range, ascending
 * 4. OS-assigned ephemeral port, unless random was explicitly disabled
 *
 * A port counts as free only when it binds on every address of the host
 * set. Probes run strictly one after another and each socket is released
 * before the next bind, so nothing is held across candidates or hosts.
 */

use std::collections::HashSet;
use std::time::Duration;

use super::host::HostSpec;
use super::options::{GetPortOptions, ResolutionOptions};
use super::probe::{SocketProbe, TcpProbe};
use super::safe::is_safe_port;
use crate::config::EnvDefaults;
use crate::errors::{PortError, Result};

/// Ports below this need elevated privileges to bind on most systems
pub const PRIVILEGED_PORT_LIMIT: u16 = 1024;

pub const DEFAULT_WAIT_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_WAIT_RETRIES: u32 = 4;

/// Polling settings for [`PortResolver::wait_for_port`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    pub delay: Duration,
    pub retries: u32,
    /// Every address must refuse the bind for the port to count as up
    pub host: HostSpec,
}

impl Default for WaitOptions {
    fn default() -> Self {
        WaitOptions {
            delay: DEFAULT_WAIT_DELAY,
            retries: DEFAULT_WAIT_RETRIES,
            host: HostSpec::Default,
        }
    }
}

impl WaitOptions {
    pub fn delay_ms(mut self, delay: u64) -> Self {
        self.delay = Duration::from_millis(delay);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = HostSpec::Single(host.into());
        self
    }

    pub fn hosts(mut self, hosts: HostSpec) -> Self {
        self.host = hosts;
        self
    }
}

/// Resolves ports through a [`SocketProbe`]
///
/// Holds no state between calls beyond the probe and the environment
/// defaults it was built with.
#[derive(Debug, Clone)]
pub struct PortResolver<P: SocketProbe = TcpProbe> {
    probe: P,
    env: EnvDefaults,
}

impl PortResolver<TcpProbe> {
    /// Real TCP probe, `PORT`/`HOST` read from the environment
    pub fn new() -> Self {
        PortResolver {
            probe: TcpProbe,
            env: EnvDefaults::from_env(),
        }
    }
}

impl Default for PortResolver<TcpProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SocketProbe> PortResolver<P> {
    /// Custom probe with no environment defaults
    pub fn with_probe(probe: P) -> Self {
        PortResolver {
            probe,
            env: EnvDefaults::default(),
        }
    }

    pub fn with_env(mut self, env: EnvDefaults) -> Self {
        self.env = env;
        self
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn env_defaults(&self) -> &EnvDefaults {
        &self.env
    }

    /// Resolve a port through the full cascade
    ///
    /// # Errors
    /// Returns `PortError::Exhausted` when every stage failed, or
    /// `PortError::RandomAssignment` when the random shortcut was taken and
    /// the OS handed out nothing.
    pub async fn get_port(&self, options: impl Into<GetPortOptions>) -> Result<u16> {
        let options = ResolutionOptions::resolve(&options.into(), &self.env);
        let verbose = options.verbose;

        if options.random && !options.specified_any_port {
            return self.get_random_port(&options.host).await;
        }

        let candidates = safe_candidates(options.primary_candidates(), &options);
        let mut available = self.find_port(&candidates, &options.host).await;

        if available.is_none() && !options.alternative_port_range.is_empty() {
            let alternatives = safe_candidates(options.alternative_port_range.generate(false), &options);
            available = self.find_port(&alternatives, &options.host).await;

            if !candidates.is_empty() {
                let mut message = format!(
                    "Unable to find an available port (tried {} {}).",
                    compact_ports(&candidates),
                    options.host.label()
                );
                if let Some(port) = available {
                    message.push_str(&format!(" Using alternative port {}.", port));
                }
                log(verbose, &options.name, &message);
            }
        }

        if available.is_none() && options.random_fallback {
            available = self.check_port(0, &options.host, verbose).await;
            if let Some(port) = available {
                log(verbose, &options.name, &format!("Using random port {}", port));
            }
        }

        available.ok_or_else(|| {
            let tried = options.tried_summary();
            PortError::Exhausted(format!(
                "Unable to find an available port {} (tried {})",
                options.host.label(),
                if tried.is_empty() { "no candidates".to_string() } else { tried }
            ))
        })
    }

    /// Ask the OS for an ephemeral port that binds on every host address
    pub async fn get_random_port(&self, host: &HostSpec) -> Result<u16> {
        self.check_port(0, host, false).await.ok_or_else(|| {
            PortError::RandomAssignment(format!("Unable to find a random port {}", host.label()))
        })
    }

    /// First candidate that binds on every address of `host`
    ///
    /// Candidates are tried in order and never retried.
    pub async fn find_port(&self, candidates: &[u16], host: &HostSpec) -> Option<u16> {
        let targets = host.targets();
        for &port in candidates {
            if let Some(port) = self.check_port_on(port, &targets, false).await {
                return Some(port);
            }
        }
        None
    }

    /// Check one port against `host`
    ///
    /// Returns the bound port, which differs from `port` only when `port` is
    /// 0. With several addresses the first OS-assigned port is pinned and
    /// then verified on the rest, so the result is one port free everywhere.
    pub async fn check_port(&self, port: u16, host: &HostSpec, verbose: bool) -> Option<u16> {
        self.check_port_on(port, &host.targets(), verbose).await
    }

    async fn check_port_on(&self, mut port: u16, targets: &[Option<String>], verbose: bool) -> Option<u16> {
        if targets.is_empty() {
            return None;
        }

        for host in targets {
            match self.probe.try_port(port, host.as_deref()).await {
                Some(bound) => {
                    if port == 0 {
                        port = bound;
                    }
                }
                None => {
                    if verbose && port != 0 && port < PRIVILEGED_PORT_LIMIT {
                        tracing::warn!(
                            "[portseek] Unable to listen to the privileged port {} {}",
                            port,
                            host_label(host.as_deref())
                        );
                    }
                    return None;
                }
            }
        }

        tracing::debug!(port, hosts = targets.len(), "port available");
        Some(port)
    }

    /// Poll until something is listening on `port`
    ///
    /// Each round runs [`check_port`](Self::check_port) against the host
    /// set: a failed check means the port is taken and the wait is over. A
    /// free port costs one retry and one `delay` sleep.
    /// Zero `retries` or zero `delay` fall back to the defaults.
    pub async fn wait_for_port(&self, port: u16, options: &WaitOptions) -> Result<()> {
        let delay = if options.delay.is_zero() { DEFAULT_WAIT_DELAY } else { options.delay };
        let retries = if options.retries == 0 { DEFAULT_WAIT_RETRIES } else { options.retries };

        for remaining in (1..=retries).rev() {
            if self.check_port(port, &options.host, false).await.is_none() {
                return Ok(());
            }
            tracing::debug!(port, remaining = remaining - 1, "port still free, waiting");
            tokio::time::sleep(delay).await;
        }

        Err(PortError::WaitTimeout(format!(
            "Timeout waiting for port {} after {} retries with {}ms interval.",
            port,
            retries,
            delay.as_millis()
        )))
    }
}

/// Drop 0, unsafe ports and repeats, keeping first-seen order
fn safe_candidates(ports: Vec<u16>, options: &ResolutionOptions) -> Vec<u16> {
    let mut seen = HashSet::new();
    ports
        .into_iter()
        .filter(|&port| {
            if port == 0 {
                return false;
            }
            if !is_safe_port(port) {
                log(options.verbose, &options.name, &format!("Ignoring unsafe port: {}", port));
                return false;
            }
            seen.insert(port)
        })
        .collect()
}

/// Ascending runs collapse to `a-b`: `[4000, 4001, 4002, 4321]` is
/// `4000-4002, 4321`
fn compact_ports(ports: &[u16]) -> String {
    let mut runs: Vec<(u16, u16)> = Vec::new();
    for &port in ports {
        match runs.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(port) => *end = port,
            _ => runs.push((port, port)),
        }
    }

    runs.iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn host_label(host: Option<&str>) -> String {
    match host {
        Some(host) => format!("on host {:?}", host),
        None => "on any host".to_string(),
    }
}

fn log(verbose: bool, name: &str, message: &str) {
    if verbose {
        tracing::info!("[portseek] [{}] {}", name, message);
    }
}
