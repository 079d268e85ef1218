/**
 * port module
 * Available-port resolution across local interfaces
 */

pub mod host;
pub mod options;
pub mod probe;
pub mod range;
pub mod resolver;
pub mod safe;

pub use host::{local_hosts, resolve_host, validate_hostname, HostSpec};
pub use options::{GetPortOptions, ResolutionOptions, DEFAULT_ALTERNATIVE_RANGE};
pub use probe::{SocketProbe, TcpProbe};
pub use range::PortRange;
pub use resolver::{PortResolver, WaitOptions, DEFAULT_WAIT_DELAY, DEFAULT_WAIT_RETRIES};
pub use safe::{is_safe_port, is_unsafe_port, UNSAFE_PORTS};
