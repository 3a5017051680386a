use crate::error::ProbeError;
use crate::net::socket::{Socket, SocketError};
use crate::net::ErrorMapper;
use crate::probe::{unsupported, Endpoint, Outcome, Probe};
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Probe a `TCP` port by completing the three-way handshake.
///
/// No data is exchanged, the connection is closed as soon as it is established.
#[derive(Debug)]
pub struct TcpProbe<S> {
    timeout: Duration,
    _socket: PhantomData<S>,
}

impl<S: Socket> TcpProbe<S> {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            _socket: PhantomData,
        }
    }
}

impl<S: Socket> Probe for TcpProbe<S> {
    #[instrument(skip(self), level = "debug")]
    fn probe(&mut self, endpoint: &Endpoint) -> Outcome {
        let Endpoint::Socket(addr) = endpoint else {
            return Err(unsupported(endpoint));
        };
        let mut socket = S::new_stream_socket_ipv4()?;
        let latency = connect(&mut socket, SocketAddr::V4(*addr), self.timeout)?;
        if let Err(err) = socket.shutdown() {
            tracing::debug!(%err, "shutdown failed");
        }
        Ok(latency)
    }
}

/// Connect a non-blocking socket and wait for the handshake to complete.
pub(super) fn connect<S: Socket>(socket: &mut S, addr: SocketAddr, timeout: Duration) -> Outcome {
    let start = Instant::now();
    socket.connect(addr).or_else(ErrorMapper::in_progress)?;
    if !socket.is_writable(timeout)? {
        return Err(ProbeError::Timeout);
    }
    match socket.take_error()? {
        None => Ok(start.elapsed()),
        Some(SocketError::ConnectionRefused) => Err(ProbeError::Refused),
        Some(SocketError::Other(err)) => Err(ProbeError::TransportError(format!(
            "Connect error for {addr}: {err}"
        ))),
    }
}
