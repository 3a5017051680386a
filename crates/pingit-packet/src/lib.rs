//! Packet wire format parsing and building.
//!
//! The following packet are supported:
//! - `ICMPv4` echo request and echo reply
//! - `IPv4` (read only)
//!
//! Also provides the Internet checksum used to fill in and validate `ICMP`
//! headers.
//!
//! # Endianness
//!
//! The internal representation is held in network byte order (big-endian) and
//! all accessor methods take and return data in host byte order, converting as
//! necessary for the given architecture.
//!
//! # Example
//!
//! The following example builds an `ICMPv4` echo request packet:
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use pingit_packet::checksum::checksum;
//! use pingit_packet::icmpv4::echo_request::EchoRequestPacket;
//! use pingit_packet::icmpv4::{IcmpCode, IcmpType};
//!
//! let mut buf = [0; EchoRequestPacket::minimum_packet_size()];
//! let mut icmp = EchoRequestPacket::new(&mut buf)?;
//! icmp.set_icmp_type(IcmpType::EchoRequest);
//! icmp.set_icmp_code(IcmpCode(0));
//! icmp.set_identifier(1234);
//! icmp.set_sequence(10);
//! icmp.set_checksum(checksum(icmp.packet()));
//! assert_eq!(icmp.packet(), &hex_literal::hex!("08 00 f3 23 04 d2 00 0a"));
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod buffer;

/// Packet errors.
pub mod error;

/// The Internet checksum.
pub mod checksum;

/// `ICMPv4` packets.
pub mod icmpv4;

/// `IPv4` packets.
pub mod ipv4;

/// The IP packet next layer protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IpProtocol {
    Icmp,
    Udp,
    Tcp,
    Other(u8),
}

impl IpProtocol {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Icmp => 1,
            Self::Udp => 17,
            Self::Tcp => 6,
            Self::Other(id) => id,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::Icmp,
            17 => Self::Udp,
            6 => Self::Tcp,
            p => Self::Other(p),
        }
    }
}

/// Format a payload as a hexadecimal string.
#[must_use]
pub fn fmt_payload(bytes: &[u8]) -> String {
    use itertools::Itertools as _;
    format!("{:02x}", bytes.iter().format(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_payload() {
        assert_eq!("08 00 f3 23", fmt_payload(&[0x08, 0x00, 0xf3, 0x23]));
        assert_eq!("", fmt_payload(&[]));
    }

    #[test]
    fn test_ip_protocol() {
        assert_eq!(IpProtocol::Icmp, IpProtocol::from(1));
        assert_eq!(IpProtocol::Other(99), IpProtocol::from(99));
        assert_eq!(17, IpProtocol::Udp.id());
    }
}
