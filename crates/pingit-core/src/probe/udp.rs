use crate::error::ProbeError;
use crate::net::socket::Socket;
use crate::probe::{unsupported, Endpoint, Outcome, Probe};
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::instrument;

/// The size of the buffer used to receive a reply; the contents are discarded.
const MAX_REPLY_SIZE: usize = 1024;

/// Probe a `UDP` port by sending an empty datagram and waiting for any reply.
///
/// Many reachable `UDP` services never answer an empty datagram, in which case
/// the probe reports [`ProbeError::Timeout`] exactly as it would for an
/// unreachable host. An `ICMP` port unreachable returned by the target is
/// reported as [`ProbeError::Refused`].
#[derive(Debug)]
pub struct UdpProbe<S> {
    timeout: Duration,
    _socket: PhantomData<S>,
}

impl<S: Socket> UdpProbe<S> {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            _socket: PhantomData,
        }
    }
}

impl<S: Socket> Probe for UdpProbe<S> {
    #[instrument(skip(self), level = "debug")]
    fn probe(&mut self, endpoint: &Endpoint) -> Outcome {
        let Endpoint::Socket(addr) = endpoint else {
            return Err(unsupported(endpoint));
        };
        let mut socket = S::new_udp_socket_ipv4()?;
        exchange(&mut socket, SocketAddr::V4(*addr), self.timeout)
    }
}

/// Send an empty datagram on a connected socket and wait for the first reply.
///
/// The socket is connected so that the OS reports `ICMP` port unreachable
/// errors back to it.
pub(super) fn exchange<S: Socket>(socket: &mut S, addr: SocketAddr, timeout: Duration) -> Outcome {
    socket.connect(addr)?;
    let start = Instant::now();
    socket.send(&[])?;
    if !socket.is_readable(timeout)? {
        return Err(ProbeError::Timeout);
    }
    let mut buf = [0_u8; MAX_REPLY_SIZE];
    let (bytes_read, from) = socket.recv_from(&mut buf)?;
    let latency = start.elapsed();
    tracing::debug!(bytes_read, ?from, ?latency, "udp reply");
    Ok(latency)
}
