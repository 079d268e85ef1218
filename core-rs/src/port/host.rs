//! Host selection for probes
//!
//! A request probes either one named address, an explicit list, or the
//! default local set (unspecified address, `0.0.0.0` and every routable
//! interface address on this machine).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    // 1-63 chars of [0-9.:A-Za-z-], not starting or ending with '-'
    Regex::new(r"^[0-9.:A-Za-z](?:[0-9.:A-Za-z-]{0,61}[0-9.:A-Za-z])?$").expect("valid hostname regex")
});

/// Where a check probes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HostSpec {
    /// Local host set, see [`local_hosts`]
    #[default]
    Default,
    Single(String),
    /// Every address must bind for the port to count as free
    List(Vec<String>),
}

impl HostSpec {
    /// `None` maps to the default local set
    pub fn from_option(host: Option<String>) -> Self {
        match host {
            Some(host) => HostSpec::Single(host),
            None => HostSpec::Default,
        }
    }

    /// Concrete probe targets, `None` meaning the unspecified address
    pub fn targets(&self) -> Vec<Option<String>> {
        match self {
            HostSpec::Default => local_hosts(),
            HostSpec::Single(host) => vec![Some(host.clone())],
            HostSpec::List(hosts) => hosts.iter().cloned().map(Some).collect(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            HostSpec::Default => "on any host".to_string(),
            HostSpec::Single(host) => format!("on host {:?}", host),
            HostSpec::List(hosts) => format!("on hosts {:?}", hosts),
        }
    }
}

/// Empty means the default set, one entry a single host
impl From<Vec<String>> for HostSpec {
    fn from(mut hosts: Vec<String>) -> Self {
        match hosts.len() {
            0 => HostSpec::Default,
            1 => HostSpec::Single(hosts.remove(0)),
            _ => HostSpec::List(hosts),
        }
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Check a user-supplied hostname, falling back to a safe literal when it
/// is malformed: `0.0.0.0` for public servers, `127.0.0.1` otherwise.
pub fn validate_hostname(hostname: Option<&str>, public: bool, verbose: bool) -> Option<String> {
    let hostname = hostname.filter(|h| !h.is_empty())?;

    if HOSTNAME_RE.is_match(hostname) {
        return Some(hostname.to_string());
    }

    let fallback = if public { "0.0.0.0" } else { "127.0.0.1" };
    if verbose {
        tracing::warn!(
            "[portseek] Invalid hostname: {:?}. Using {:?} as fallback.",
            hostname,
            fallback
        );
    }
    Some(fallback.to_string())
}

/// Resolve the caller's host option into a [`HostSpec`]
pub fn resolve_host(hostname: Option<&str>, public: bool, verbose: bool) -> HostSpec {
    HostSpec::from_option(validate_hostname(hostname, public, verbose))
}

/// Default probe set: unspecified, `0.0.0.0`, then external interface
/// addresses in enumeration order (duplicates removed).
pub fn local_hosts() -> Vec<Option<String>> {
    let mut hosts: Vec<Option<String>> = vec![None, Some("0.0.0.0".to_string())];

    for address in interface_addresses() {
        let address = Some(address);
        if !hosts.contains(&address) {
            hosts.push(address);
        }
    }
    hosts
}

fn is_link_local(address: &str) -> bool {
    address.starts_with("fe80::") || address.starts_with("169.254")
}

#[cfg(unix)]
fn interface_addresses() -> Vec<String> {
    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;
    use std::net::{SocketAddrV4, SocketAddrV6};

    let interfaces = match getifaddrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            tracing::debug!(error = %e, "interface enumeration failed, using defaults only");
            return Vec::new();
        }
    };

    interfaces
        .filter(|iface| !iface.flags.contains(InterfaceFlags::IFF_LOOPBACK))
        .filter_map(|iface| {
            let address = iface.address?;
            if let Some(v4) = address.as_sockaddr_in() {
                Some(SocketAddrV4::from(*v4).ip().to_string())
            } else {
                address
                    .as_sockaddr_in6()
                    .map(|v6| SocketAddrV6::from(*v6).ip().to_string())
            }
        })
        .filter(|address| !is_link_local(address))
        .collect()
}

#[cfg(not(unix))]
fn interface_addresses() -> Vec<String> {
    Vec::new()
}
