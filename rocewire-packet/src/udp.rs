//! UDP header

use crate::checksum::transport_checksum;
use crate::ip::IPPROTO_UDP;
use bytes::{BufMut, BytesMut};
use rocewire_core::{Error, Result};
use std::net::Ipv4Addr;

/// IANA-assigned destination port for RoCEv2
pub const ROCEV2_PORT: u16 = 4791;

/// 8-byte UDP header
///
/// `length` is resolved by the packet stack at finalize time. The
/// checksum stays zero unless the caller computes one: RoCEv2 senders
/// transmit a zero UDP checksum and rely on the invariant CRC instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    /// Source port
    pub source_port: u16,
    /// Destination port
    pub destination_port: u16,
    /// Length of header plus payload
    pub length: u16,
    /// Checksum (zero = none)
    pub checksum: u16,
}

impl UdpHeader {
    /// Header size on the wire
    pub const SIZE: usize = 8;

    /// Create a header addressed to the RoCEv2 port
    pub fn new(source_port: u16) -> Self {
        Self {
            source_port,
            destination_port: ROCEV2_PORT,
            length: 0,
            checksum: 0,
        }
    }

    /// Override the destination port
    pub fn with_destination_port(mut self, port: u16) -> Self {
        self.destination_port = port;
        self
    }

    /// Compute and set the pseudo-header checksum over `payload`
    ///
    /// `length` must already be resolved. A computed value of zero is
    /// transmitted as 0xFFFF so it cannot be mistaken for "no checksum".
    pub fn update_checksum(&mut self, src: Ipv4Addr, dst: Ipv4Addr, payload: &[u8]) {
        self.checksum = 0;
        let mut segment = self.encode();
        segment.extend_from_slice(payload);

        let checksum = transport_checksum(&src.octets(), &dst.octets(), IPPROTO_UDP, &segment);
        self.checksum = if checksum == 0 { 0xFFFF } else { checksum };
    }

    /// Serialize to 8 bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_u16(self.source_port);
        buf.put_u16(self.destination_port);
        buf.put_u16(self.length);
        buf.put_u16(self.checksum);
        buf.to_vec()
    }

    /// Parse from the first 8 bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                needed: Self::SIZE,
                got: data.len(),
            });
        }

        Ok(Self {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            length: u16::from_be_bytes([data[4], data[5]]),
            checksum: u16::from_be_bytes([data[6], data[7]]),
        })
    }
}
