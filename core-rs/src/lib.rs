//! # portseek
//!
//! Finds a free TCP port before a server starts, and waits for a server to
//! start listening.
//!
//! ## Resolution order
//!
//! ```text
//!  requested port ─► extra ports ─► port range ─► alternative range ─► OS-assigned
//!        └──────── safe-port filter ────────┘        (3000-3100)         (port 0)
//! ```
//!
//! A candidate is accepted only when it binds on every address of the host
//! set. Nothing is cached: a returned port can still be taken by someone
//! else before the caller binds it.
//!
//! ```no_run
//! # async fn run() -> portseek::errors::Result<()> {
//! use portseek::GetPortOptions;
//!
//! let port = portseek::get_port(GetPortOptions::new().port(4321).alternative_port_range(5000, 5002)).await?;
//! portseek::wait_for_port(port, &portseek::WaitOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod port;

pub use config::EnvDefaults;
pub use errors::PortError;
pub use port::{
    is_safe_port, is_unsafe_port, GetPortOptions, HostSpec, PortRange, PortResolver, SocketProbe, TcpProbe,
    WaitOptions,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve a port with the real TCP probe and `PORT`/`HOST` defaults
pub async fn get_port(options: impl Into<GetPortOptions>) -> errors::Result<u16> {
    PortResolver::new().get_port(options).await
}

/// OS-assigned port free on `host` (or on the default local set)
pub async fn get_random_port(host: Option<&str>) -> errors::Result<u16> {
    let host = HostSpec::from_option(host.map(String::from));
    PortResolver::new().get_random_port(&host).await
}

/// Bound port when `port` is free on every address of `host`
pub async fn check_port(port: u16, host: &HostSpec, verbose: bool) -> Option<u16> {
    PortResolver::new().check_port(port, host, verbose).await
}

/// Wait until something listens on `port`
pub async fn wait_for_port(port: u16, options: &WaitOptions) -> errors::Result<()> {
    PortResolver::new().wait_for_port(port, options).await
}
