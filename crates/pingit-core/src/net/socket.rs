use crate::error::IoResult as Result;
use std::net::SocketAddr;
use std::time::Duration;

/// A non-blocking `IPv4` socket.
///
/// Every socket is owned by a single probe attempt and is closed when dropped.
#[cfg_attr(test, mockall::automock)]
pub trait Socket
where
    Self: Sized,
{
    /// Create a socket for sending `ICMP` echo requests and receiving replies.
    ///
    /// A raw socket is created when `raw` is set, otherwise an `IPPROTO_ICMP` datagram socket.
    fn new_icmp_socket_ipv4(raw: bool) -> Result<Self>;
    /// Create a `UDP` datagram socket.
    fn new_udp_socket_ipv4() -> Result<Self>;
    /// Create a `TCP` stream socket.
    fn new_stream_socket_ipv4() -> Result<Self>;
    fn connect(&mut self, address: SocketAddr) -> Result<()>;
    /// Send on a connected socket.
    fn send(&mut self, buf: &[u8]) -> Result<()>;
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> Result<()>;
    /// Returns true if the socket becomes readable before the timeout, false otherwise.
    fn is_readable(&mut self, timeout: Duration) -> Result<bool>;
    /// Returns true if the socket becomes writable before the timeout, false otherwise.
    fn is_writable(&mut self, timeout: Duration) -> Result<bool>;
    fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, Option<SocketAddr>)>;
    fn shutdown(&mut self) -> Result<()>;
    fn take_error(&mut self) -> Result<Option<SocketError>>;
}

/// A socket error returned by `Socket::take_error`.
#[derive(Debug)]
pub enum SocketError {
    ConnectionRefused,
    Other(std::io::Error),
}
