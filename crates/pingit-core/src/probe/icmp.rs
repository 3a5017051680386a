use crate::config::PrivilegeMode;
use crate::error::ProbeError;
use crate::net::socket::Socket;
use crate::probe::{unsupported, Endpoint, Outcome, Probe};
use crate::types::{Identifier, Sequence};
use pingit_packet::checksum::checksum;
use pingit_packet::icmpv4::echo_reply::EchoReplyPacket;
use pingit_packet::icmpv4::echo_request::EchoRequestPacket;
use pingit_packet::icmpv4::{IcmpCode, IcmpType};
use pingit_packet::ipv4::Ipv4Packet;
use pingit_packet::IpProtocol;
use std::marker::PhantomData;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tracing::instrument;

/// The maximum size of a received `IPv4` datagram.
const MAX_PACKET_SIZE: usize = 1024;

/// Probe a host with an `ICMP` Echo Request.
///
/// In [`PrivilegeMode::Privileged`] mode a raw socket is used, which requires
/// the `CAP_NET_RAW` capability (Linux) or root. Failing to open it is reported
/// as [`ProbeError::PermissionDenied`].
#[derive(Debug)]
pub struct IcmpProbe<S> {
    timeout: Duration,
    privilege_mode: PrivilegeMode,
    identifier: Identifier,
    sequence: Sequence,
    _socket: PhantomData<S>,
}

impl<S: Socket> IcmpProbe<S> {
    #[must_use]
    pub const fn new(
        timeout: Duration,
        privilege_mode: PrivilegeMode,
        identifier: Identifier,
        sequence: Sequence,
    ) -> Self {
        Self {
            timeout,
            privilege_mode,
            identifier,
            sequence,
            _socket: PhantomData,
        }
    }
}

impl<S: Socket> Probe for IcmpProbe<S> {
    #[instrument(skip(self), level = "debug")]
    fn probe(&mut self, endpoint: &Endpoint) -> Outcome {
        let Endpoint::Host(addr) = endpoint else {
            return Err(unsupported(endpoint));
        };
        let raw = !self.privilege_mode.is_unprivileged();
        let mut socket = S::new_icmp_socket_ipv4(raw)?;
        let mut buf = [0_u8; EchoRequestPacket::minimum_packet_size()];
        let packet = make_echo_request(&mut buf, self.identifier, self.sequence)?;
        echo(
            &mut socket,
            packet.packet(),
            *addr,
            EchoMatch {
                identifier: raw.then_some(self.identifier),
                sequence: self.sequence,
            },
            self.timeout,
        )
    }
}

/// Build an 8 byte `ICMP` Echo Request header.
///
/// The checksum is computed with the checksum field zeroed and then written in
/// network byte order.
pub(super) fn make_echo_request(
    buf: &mut [u8],
    identifier: Identifier,
    sequence: Sequence,
) -> Result<EchoRequestPacket<'_>, ProbeError> {
    let mut packet =
        EchoRequestPacket::new(buf).map_err(|err| ProbeError::TransportError(err.to_string()))?;
    packet.set_icmp_type(IcmpType::EchoRequest);
    packet.set_icmp_code(IcmpCode(0));
    packet.set_checksum(0);
    packet.set_identifier(identifier.0);
    packet.set_sequence(sequence.0);
    packet.set_checksum(checksum(packet.packet()));
    Ok(packet)
}

/// The fields an Echo Reply must carry to be accepted.
#[derive(Debug, Clone, Copy)]
pub(super) struct EchoMatch {
    /// Unprivileged sockets have the identifier rewritten by the kernel, so it is not checked.
    pub identifier: Option<Identifier>,
    pub sequence: Sequence,
}

/// Send the Echo Request and wait for the matching Echo Reply.
///
/// Unrelated `ICMP` traffic seen by the socket is skipped until the timeout
/// expires.
pub(super) fn echo<S: Socket>(
    socket: &mut S,
    request: &[u8],
    addr: Ipv4Addr,
    expected: EchoMatch,
    timeout: Duration,
) -> Outcome {
    let start = Instant::now();
    socket.send_to(request, SocketAddr::new(IpAddr::V4(addr), 0))?;
    let mut buf = [0_u8; MAX_PACKET_SIZE];
    loop {
        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() || !socket.is_readable(remaining)? {
            return Err(ProbeError::Timeout);
        }
        let (bytes_read, from) = socket.recv_from(&mut buf)?;
        let latency = start.elapsed();
        if from.is_some_and(|from| from.ip() != IpAddr::V4(addr)) {
            tracing::trace!(?from, "ignoring icmp from other host");
            continue;
        }
        if is_echo_reply(&buf[..bytes_read], expected) {
            return Ok(latency);
        }
    }
}

/// Is this datagram the Echo Reply we are waiting for?
///
/// Raw sockets (and datagram sockets on some platforms) deliver the `IPv4`
/// header along with the `ICMP` message.
fn is_echo_reply(datagram: &[u8], expected: EchoMatch) -> bool {
    let ipv4;
    let icmp = match datagram.first() {
        Some(byte) if byte >> 4 == 4 => {
            ipv4 = match Ipv4Packet::new_view(datagram) {
                Ok(ipv4) if ipv4.get_protocol() == IpProtocol::Icmp => ipv4,
                _ => return false,
            };
            ipv4.payload()
        }
        _ => datagram,
    };
    let Ok(reply) = EchoReplyPacket::new_view(icmp) else {
        return false;
    };
    tracing::trace!(?reply);
    reply.get_icmp_type() == IcmpType::EchoReply
        && reply.get_sequence() == expected.sequence.0
        && expected
            .identifier
            .is_none_or(|identifier| reply.get_identifier() == identifier.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IoError, IoOperation, IoResult};
    use crate::mocket_recv_from;
    use crate::net::socket::MockSocket;
    use hex_literal::hex;
    use mockall::predicate;
    use mockall::Sequence as CallSequence;
    use std::io;

    const TARGET: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
    const TIMEOUT: Duration = Duration::from_secs(5);
    const EXPECTED: EchoMatch = EchoMatch {
        identifier: Some(Identifier(1234)),
        sequence: Sequence(1),
    };

    fn target_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(TARGET), 0)
    }

    #[test]
    fn test_make_echo_request() {
        let mut buf = [0_u8; 8];
        let packet = make_echo_request(&mut buf, Identifier(1234), Sequence(1)).unwrap();
        assert_eq!(&hex!("08 00 f3 2c 04 d2 00 01"), packet.packet());
        assert_eq!(0, checksum(packet.packet()));
    }

    #[test]
    fn test_make_echo_request_zero_identifier() {
        let mut buf = [0_u8; 8];
        let packet = make_echo_request(&mut buf, Identifier(0), Sequence(0)).unwrap();
        assert_eq!(&hex!("08 00 f7 ff 00 00 00 00"), packet.packet());
    }

    #[test]
    fn test_is_echo_reply_with_ipv4_header() {
        let datagram = hex!(
            "45 00 00 1c 00 00 00 00 40 01 00 00 c0 00 02 01
             c0 00 02 02 00 00 fb 2c 04 d2 00 01"
        );
        assert!(is_echo_reply(&datagram, EXPECTED));
    }

    #[test]
    fn test_is_echo_reply_with_ipv4_options() {
        let datagram = hex!(
            "46 00 00 20 00 00 00 00 40 01 00 00 c0 00 02 01
             c0 00 02 02 01 01 01 01 00 00 fb 2c 04 d2 00 01"
        );
        assert!(is_echo_reply(&datagram, EXPECTED));
    }

    #[test]
    fn test_is_not_echo_reply_with_ipv4_options_misread() {
        let datagram = hex!(
            "45 00 00 20 00 00 00 00 40 01 00 00 c0 00 02 01
             c0 00 02 02 01 01 01 01 00 00 fb 2c 04 d2 00 01"
        );
        assert!(!is_echo_reply(&datagram, EXPECTED));
    }

    #[test]
    fn test_is_not_echo_reply_non_icmp_datagram() {
        let datagram = hex!(
            "45 00 00 1c 00 00 00 00 40 11 00 00 c0 00 02 01
             c0 00 02 02 00 00 fb 2c 04 d2 00 01"
        );
        assert!(!is_echo_reply(&datagram, EXPECTED));
    }

    #[test]
    fn test_is_echo_reply_without_ipv4_header() {
        let datagram = hex!("00 00 fb 2c 04 d2 00 01");
        assert!(is_echo_reply(&datagram, EXPECTED));
    }

    #[test]
    fn test_unprivileged_ignores_identifier() {
        let datagram = hex!("00 00 00 00 99 99 00 01");
        let expected = EchoMatch {
            identifier: None,
            sequence: Sequence(1),
        };
        assert!(is_echo_reply(&datagram, expected));
        assert!(!is_echo_reply(&datagram, EXPECTED));
    }

    #[test]
    fn test_is_not_echo_reply() {
        assert!(!is_echo_reply(&hex!("08 00 f3 2c 04 d2 00 01"), EXPECTED));
        assert!(!is_echo_reply(&hex!("00 00 fb 2c 04 d2 00 02"), EXPECTED));
        assert!(!is_echo_reply(&hex!("00 00 fb"), EXPECTED));
        assert!(!is_echo_reply(&[], EXPECTED));
    }

    #[test]
    fn test_echo_reply_received() {
        let reply = hex!("00 00 fb 2c 04 d2 00 01");
        let request = hex!("08 00 f3 2c 04 d2 00 01");
        let mut mocket = MockSocket::new();
        mocket
            .expect_send_to()
            .withf(move |buf: &[u8], addr: &SocketAddr| buf == request && *addr == target_addr())
            .times(1)
            .returning(|_, _| Ok(()));
        mocket.expect_is_readable().times(1).returning(|_| Ok(true));
        mocket
            .expect_recv_from()
            .times(1)
            .returning(mocket_recv_from!(reply, target_addr()));
        assert!(echo(&mut mocket, &request, TARGET, EXPECTED, TIMEOUT).is_ok());
    }

    #[test]
    fn test_skips_unrelated_traffic() {
        let other_host = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7)), 0);
        let reply = hex!("00 00 fb 2c 04 d2 00 01");
        let unreachable = hex!("03 03 fc fc 00 00 00 00");
        let mut seq = CallSequence::new();
        let mut mocket = MockSocket::new();
        mocket.expect_send_to().times(1).returning(|_, _| Ok(()));
        mocket.expect_is_readable().times(3).returning(|_| Ok(true));
        mocket
            .expect_recv_from()
            .times(1)
            .in_sequence(&mut seq)
            .returning(mocket_recv_from!(reply, other_host));
        mocket
            .expect_recv_from()
            .times(1)
            .in_sequence(&mut seq)
            .returning(mocket_recv_from!(unreachable, target_addr()));
        mocket
            .expect_recv_from()
            .times(1)
            .in_sequence(&mut seq)
            .returning(mocket_recv_from!(reply, target_addr()));
        assert!(echo(&mut mocket, &[0; 8], TARGET, EXPECTED, TIMEOUT).is_ok());
    }

    #[test]
    fn test_no_reply_is_timeout() {
        let mut mocket = MockSocket::new();
        mocket.expect_send_to().times(1).returning(|_, _| Ok(()));
        mocket
            .expect_is_readable()
            .with(predicate::le(TIMEOUT))
            .times(1)
            .returning(|_| Ok(false));
        mocket.expect_recv_from().never();
        let err = echo(&mut mocket, &[0; 8], TARGET, EXPECTED, TIMEOUT).unwrap_err();
        assert_eq!(ProbeError::Timeout, err);
    }

    #[test]
    fn test_send_failure_is_transport_error() {
        let mut mocket = MockSocket::new();
        mocket.expect_send_to().times(1).returning(|_, addr| {
            Err(IoError::SendTo(
                io::Error::from(io::ErrorKind::AddrNotAvailable),
                addr,
            ))
        });
        let err = echo(&mut mocket, &[0; 8], TARGET, EXPECTED, TIMEOUT).unwrap_err();
        assert!(matches!(err, ProbeError::TransportError(msg) if msg.starts_with("Sendto error for 192.0.2.1:0")));
    }

    #[test]
    fn test_probe_permission_denied() {
        let ctx = MockSocket::new_icmp_socket_ipv4_context();
        ctx.expect().with(predicate::eq(true)).returning(|_| -> IoResult<MockSocket> {
            Err(IoError::Other(
                io::Error::from(io::ErrorKind::PermissionDenied),
                IoOperation::NewSocket,
            ))
        });
        let mut probe = IcmpProbe::<MockSocket>::new(
            TIMEOUT,
            PrivilegeMode::Privileged,
            Identifier(1234),
            Sequence(1),
        );
        let err = probe.probe(&Endpoint::Host(TARGET)).unwrap_err();
        assert_eq!(ProbeError::PermissionDenied, err);
    }
}
