//! Single bind attempt against one (port, host) pair

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::net::TcpListener;

use super::safe::is_safe_port;

/// Raw availability primitive the resolver drives.
///
/// `try_port` binds `port` on `host` (`None` = the unspecified address),
/// releases the socket before returning, and yields the port that was
/// actually bound. Asking for port 0 yields the OS-assigned port. Any bind
/// failure is `None`; it is never an error.
pub trait SocketProbe: Send + Sync {
    fn try_port(&self, port: u16, host: Option<&str>) -> impl Future<Output = Option<u16>> + Send;
}

/// Probe backed by real TCP listeners
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl TcpProbe {
    /// Bind `::` first so a dual-stack socket covers both families, and only
    /// drop to `0.0.0.0` when IPv6 itself is unavailable.
    async fn bind_unspecified(port: u16) -> io::Result<TcpListener> {
        match TcpListener::bind((Ipv6Addr::UNSPECIFIED, port)).await {
            Ok(listener) => Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(e),
            Err(_) => TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await,
        }
    }
}

impl SocketProbe for TcpProbe {
    async fn try_port(&self, port: u16, host: Option<&str>) -> Option<u16> {
        let bound = match host {
            Some(host) => TcpListener::bind((host, port)).await,
            None => Self::bind_unspecified(port).await,
        };

        let listener = match bound {
            Ok(listener) => listener,
            Err(e) => {
                tracing::debug!(port, host = host.unwrap_or("*"), error = %e, "bind failed");
                return None;
            }
        };

        let local_port = listener.local_addr().ok()?.port();
        drop(listener);

        if !is_safe_port(local_port) {
            tracing::debug!(port = local_port, "bound port is on the unsafe list");
            return None;
        }
        Some(local_port)
    }
}
