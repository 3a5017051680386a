use crate::error::ProbeError;
use std::fmt::{Display, Formatter};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use url::Url;

mod http;
mod icmp;
mod tcp;
mod udp;

pub use http::HttpProbe;
pub use icmp::IcmpProbe;
pub use tcp::TcpProbe;
pub use udp::UdpProbe;

/// The outcome of a single probe: the measured latency or a classified failure.
pub type Outcome = Result<Duration, ProbeError>;

/// What a probe is sent to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Endpoint {
    /// A host, for `ICMP`.
    Host(Ipv4Addr),
    /// A host and port, for `UDP` and `TCP`.
    Socket(SocketAddrV4),
    /// An absolute `http` or `https` URL.
    Url(Url),
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(addr) => write!(f, "{addr}"),
            Self::Socket(addr) => write!(f, "{addr}"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// A probe strategy.
///
/// Each call performs one timed attempt, opening and closing its own socket or
/// connection.
#[cfg_attr(test, mockall::automock)]
pub trait Probe {
    fn probe(&mut self, endpoint: &Endpoint) -> Outcome;
}

/// The error returned when a probe is handed an endpoint of the wrong kind.
fn unsupported(endpoint: &Endpoint) -> ProbeError {
    ProbeError::TransportError(format!("unsupported endpoint {endpoint}"))
}
