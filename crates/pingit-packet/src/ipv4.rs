use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::{fmt_payload, IpProtocol};
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const VERSION_OFFSET: usize = 0;
const IHL_OFFSET: usize = 0;
const TOTAL_LENGTH_OFFSET: usize = 2;
const TIME_TO_LIVE_OFFSET: usize = 8;
const PROTOCOL_OFFSET: usize = 9;
const SOURCE_OFFSET: usize = 12;
const DESTINATION_OFFSET: usize = 16;

/// Represents a read-only view of an IPv4 Packet.
///
/// Raw `ICMP` sockets deliver the full IPv4 datagram, this view is used to
/// locate the `ICMP` message within it.
pub struct Ipv4Packet<'a> {
    buf: Buffer<'a>,
}

impl<'a> Ipv4Packet<'a> {
    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self {
                buf: Buffer::Immutable(packet),
            })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("Ipv4Packet"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        20
    }

    #[must_use]
    pub fn get_version(&self) -> u8 {
        (self.buf.read(VERSION_OFFSET) & 0xf0) >> 4
    }

    /// The header length in 32-bit words.
    #[must_use]
    pub fn get_header_length(&self) -> u8 {
        self.buf.read(IHL_OFFSET) & 0xf
    }

    #[must_use]
    pub fn get_total_length(&self) -> u16 {
        u16::from_be_bytes(self.buf.get_bytes(TOTAL_LENGTH_OFFSET))
    }

    #[must_use]
    pub fn get_ttl(&self) -> u8 {
        self.buf.read(TIME_TO_LIVE_OFFSET)
    }

    #[must_use]
    pub fn get_protocol(&self) -> IpProtocol {
        IpProtocol::from(self.buf.read(PROTOCOL_OFFSET))
    }

    #[must_use]
    pub fn get_source(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.buf.get_bytes(SOURCE_OFFSET))
    }

    #[must_use]
    pub fn get_destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.buf.get_bytes(DESTINATION_OFFSET))
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// The bytes following the header, including any options.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let header_len = usize::from(self.get_header_length()) * 4;
        let start = header_len
            .max(Self::minimum_packet_size())
            .min(self.buf.as_slice().len());
        &self.buf.as_slice()[start..]
    }
}

impl Debug for Ipv4Packet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4Packet")
            .field("version", &self.get_version())
            .field("header_length", &self.get_header_length())
            .field("total_length", &self.get_total_length())
            .field("ttl", &self.get_ttl())
            .field("protocol", &self.get_protocol())
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .field("payload", &fmt_payload(self.payload()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_view_echo_reply_datagram() {
        let buf = hex!(
            "45 00 00 1c 7a 31 00 00 40 01 02 ae 7f 00 00 01
             7f 00 00 01 00 00 f7 ff 00 00 00 00"
        );
        let packet = Ipv4Packet::new_view(&buf).unwrap();
        assert_eq!(4, packet.get_version());
        assert_eq!(5, packet.get_header_length());
        assert_eq!(28, packet.get_total_length());
        assert_eq!(64, packet.get_ttl());
        assert_eq!(IpProtocol::Icmp, packet.get_protocol());
        assert_eq!(Ipv4Addr::LOCALHOST, packet.get_source());
        assert_eq!(Ipv4Addr::LOCALHOST, packet.get_destination());
        assert_eq!(&hex!("00 00 f7 ff 00 00 00 00"), packet.payload());
    }

    #[test]
    fn test_payload_skips_options() {
        let buf = hex!(
            "46 00 00 20 00 00 00 00 40 01 00 00 0a 00 00 01
             0a 00 00 02 01 01 01 01 00 00 ff ff 00 01 00 00"
        );
        let packet = Ipv4Packet::new_view(&buf).unwrap();
        assert_eq!(6, packet.get_header_length());
        assert_eq!(&hex!("00 00 ff ff 00 01 00 00"), packet.payload());
    }

    #[test]
    fn test_payload_with_bogus_header_length() {
        let buf = hex!("4f 00 00 14 00 00 00 00 40 01 00 00 0a 00 00 01 0a 00 00 02");
        let packet = Ipv4Packet::new_view(&buf).unwrap();
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_new_view_insufficient_buffer() {
        const SIZE: usize = Ipv4Packet::minimum_packet_size();
        let buf = [0_u8; SIZE - 1];
        let err = Ipv4Packet::new_view(&buf).unwrap_err();
        assert_eq!(
            Error::InsufficientPacketBuffer(String::from("Ipv4Packet"), SIZE, SIZE - 1),
            err
        );
    }
}
