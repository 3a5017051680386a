use crate::error::{ErrorKind, IoError, IoOperation, IoResult};
use crate::net::socket::{Socket, SocketError};
use itertools::Itertools;
use nix::sys::select::FdSet;
use nix::sys::time::{TimeVal, TimeValLike};
use nix::Error;
use socket2::{Domain, Protocol, SockAddr, Type};
use std::io;
use std::net::{Shutdown, SocketAddr};
use std::os::fd::AsFd;
use std::time::Duration;
use tracing::instrument;

/// A network socket.
pub struct SocketImpl {
    inner: socket2::Socket,
}

impl SocketImpl {
    fn new(ty: Type, protocol: Protocol) -> IoResult<Self> {
        let socket = Self {
            inner: socket2::Socket::new(Domain::IPV4, ty, Some(protocol))
                .map_err(|err| IoError::Other(err, IoOperation::NewSocket))?,
        };
        socket.set_nonblocking(true)?;
        Ok(socket)
    }

    fn set_nonblocking(&self, nonblocking: bool) -> IoResult<()> {
        self.inner
            .set_nonblocking(nonblocking)
            .map_err(|err| IoError::Other(err, IoOperation::SetNonBlocking))
    }

    fn timeval(timeout: Duration) -> TimeVal {
        TimeVal::milliseconds(i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX))
    }
}

impl Socket for SocketImpl {
    #[instrument(level = "trace")]
    fn new_icmp_socket_ipv4(raw: bool) -> IoResult<Self> {
        if raw {
            Self::new(Type::RAW, Protocol::ICMPV4)
        } else {
            Self::new(Type::DGRAM, Protocol::ICMPV4)
        }
    }
    #[instrument(level = "trace")]
    fn new_udp_socket_ipv4() -> IoResult<Self> {
        Self::new(Type::DGRAM, Protocol::UDP)
    }
    #[instrument(level = "trace")]
    fn new_stream_socket_ipv4() -> IoResult<Self> {
        Self::new(Type::STREAM, Protocol::TCP)
    }
    #[instrument(skip(self), level = "trace")]
    fn connect(&mut self, address: SocketAddr) -> IoResult<()> {
        self.inner
            .connect(&SockAddr::from(address))
            .map_err(|err| IoError::Connect(err, address))
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn send(&mut self, buf: &[u8]) -> IoResult<()> {
        tracing::trace!(buf = format!("{:02x?}", buf.iter().format(" ")));
        self.inner
            .send(buf)
            .map_err(|err| IoError::Other(err, IoOperation::Send))?;
        Ok(())
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> IoResult<()> {
        tracing::trace!(buf = format!("{:02x?}", buf.iter().format(" ")), ?addr);
        self.inner
            .send_to(buf, &SockAddr::from(addr))
            .map_err(|err| IoError::SendTo(err, addr))?;
        Ok(())
    }
    #[instrument(skip(self), level = "trace")]
    fn is_readable(&mut self, timeout: Duration) -> IoResult<bool> {
        let mut read = FdSet::new();
        read.insert(self.inner.as_fd());
        let readable = nix::sys::select::select(
            None,
            Some(&mut read),
            None,
            None,
            Some(&mut Self::timeval(timeout)),
        );
        match readable {
            Ok(readable) => Ok(readable == 1),
            Err(Error::EINTR) => Ok(false),
            Err(err) => Err(IoError::Other(io::Error::from(err), IoOperation::Select)),
        }
    }
    #[instrument(skip(self), level = "trace")]
    fn is_writable(&mut self, timeout: Duration) -> IoResult<bool> {
        let mut write = FdSet::new();
        write.insert(self.inner.as_fd());
        let writable = nix::sys::select::select(
            None,
            None,
            Some(&mut write),
            None,
            Some(&mut Self::timeval(timeout)),
        );
        match writable {
            Ok(writable) => Ok(writable == 1),
            Err(Error::EINTR) => Ok(false),
            Err(err) => Err(IoError::Other(io::Error::from(err), IoOperation::Select)),
        }
    }
    #[instrument(skip(self, buf), level = "trace")]
    fn recv_from(&mut self, buf: &mut [u8]) -> IoResult<(usize, Option<SocketAddr>)> {
        let (bytes_read, addr) = self
            .inner
            .recv_from_into_buf(buf)
            .map_err(|err| IoError::Other(err, IoOperation::RecvFrom))?;
        tracing::trace!(
            buf = format!("{:02x?}", buf[..bytes_read].iter().format(" ")),
            bytes_read,
            ?addr
        );
        Ok((bytes_read, addr))
    }
    #[instrument(skip(self), level = "trace")]
    fn shutdown(&mut self) -> IoResult<()> {
        self.inner
            .shutdown(Shutdown::Both)
            .map_err(|err| IoError::Other(err, IoOperation::Shutdown))
    }
    #[instrument(skip(self), ret, level = "trace")]
    fn take_error(&mut self) -> IoResult<Option<SocketError>> {
        self.inner
            .take_error()
            .map(|err| {
                err.map(|e| match e.raw_os_error() {
                    Some(errno) if Error::from_raw(errno) == Error::ECONNREFUSED => {
                        SocketError::ConnectionRefused
                    }
                    _ => SocketError::Other(e),
                })
            })
            .map_err(|err| IoError::Other(err, IoOperation::TakeError))
    }
}

impl From<&io::Error> for ErrorKind {
    fn from(value: &io::Error) -> Self {
        if value.raw_os_error() == Some(Error::EINPROGRESS as i32) {
            Self::InProgress
        } else {
            Self::Std(value.kind())
        }
    }
}

// only used for unit tests
#[cfg(test)]
impl From<ErrorKind> for io::Error {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::InProgress => Self::from(Error::EINPROGRESS),
            ErrorKind::Std(kind) => Self::from(kind),
        }
    }
}

/// An extension trait to allow `recv_from` method which writes to a `&mut [u8]`.
///
/// This is required for `socket2::Socket` which [does not currently provide] this method.
///
/// [does not currently provide]: https://github.com/rust-lang/socket2/issues/223
trait RecvFrom {
    fn recv_from_into_buf(&self, buf: &mut [u8]) -> io::Result<(usize, Option<SocketAddr>)>;
}

impl RecvFrom for socket2::Socket {
    // Safety: the `recv` implementation promises not to write uninitialised
    // bytes to the `buf`fer, so this casting is safe.
    #![allow(unsafe_code)]
    fn recv_from_into_buf(&self, buf: &mut [u8]) -> io::Result<(usize, Option<SocketAddr>)> {
        let buf = unsafe {
            &mut *(std::ptr::from_mut::<[u8]>(buf) as *mut [std::mem::MaybeUninit<u8>])
        };
        self.recv_from(buf)
            .map(|(size, addr)| (size, addr.as_socket()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener, UdpSocket};

    #[test]
    fn test_error_kind_in_progress() {
        let err = io::Error::from(Error::EINPROGRESS);
        assert_eq!(ErrorKind::InProgress, ErrorKind::from(&err));
    }

    #[test]
    fn test_error_kind_refused() {
        let err = io::Error::from(Error::ECONNREFUSED);
        assert_eq!(
            ErrorKind::Std(io::ErrorKind::ConnectionRefused),
            ErrorKind::from(&err)
        );
    }

    #[test]
    fn test_stream_socket_connects_to_listener() -> anyhow::Result<()> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let addr = listener.local_addr()?;
        let mut socket = SocketImpl::new_stream_socket_ipv4()?;
        if let Err(err) = socket.connect(addr) {
            assert_eq!(ErrorKind::InProgress, err.kind());
        }
        assert!(socket.is_writable(Duration::from_secs(1))?);
        assert!(socket.take_error()?.is_none());
        Ok(())
    }

    #[test]
    fn test_udp_socket_receives_reply() -> anyhow::Result<()> {
        let server = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))?;
        let mut socket = SocketImpl::new_udp_socket_ipv4()?;
        socket.connect(server.local_addr()?)?;
        assert!(!socket.is_readable(Duration::from_millis(10))?);
        socket.send(b"ping")?;
        let mut buf = [0_u8; 16];
        let (len, from) = server.recv_from(&mut buf)?;
        server.send_to(&buf[..len], from)?;
        assert!(socket.is_readable(Duration::from_secs(1))?);
        let (len, _) = socket.recv_from(&mut buf)?;
        assert_eq!(b"ping", &buf[..len]);
        Ok(())
    }
}
