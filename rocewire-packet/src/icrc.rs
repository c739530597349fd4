//! Invariant CRC (ICRC) trailer
//!
//! The ICRC is a CRC-32 (IEEE 802.3 polynomial) over the fields of a
//! RoCEv2 packet that no switch or router rewrites in flight. Fields
//! that *are* rewritten (IPv4 ToS, TTL and header checksum, the UDP
//! checksum, and the BTH FECN/BECN/reserved byte) enter the CRC as all
//! ones, and 64 one-bits stand in front for the InfiniBand headers that
//! RoCEv2 does not carry.
//!
//! Unlike every other field in the packet, the resulting 32-bit value is
//! appended least-significant byte first, the same ordering as the
//! Ethernet FCS.

use crate::bth::BaseTransportHeader;
use crate::ip::Ipv4Header;
use crate::udp::UdpHeader;
use crc32fast::Hasher;
use rocewire_core::{Error, Result};

/// ICRC trailer (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcrcTrailer {
    /// The CRC value
    pub value: u32,
}

impl IcrcTrailer {
    /// Trailer size on the wire
    pub const SIZE: usize = 4;

    /// Create a trailer carrying `value`
    pub fn new(value: u32) -> Self {
        Self { value }
    }

    /// Serialize to 4 bytes, least-significant byte first
    pub fn encode(&self) -> Vec<u8> {
        self.value.to_le_bytes().to_vec()
    }

    /// Parse from the first 4 bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                needed: Self::SIZE,
                got: data.len(),
            });
        }
        Ok(Self {
            value: u32::from_le_bytes(data[0..4].try_into().unwrap()),
        })
    }
}

/// Compute the invariant CRC for a RoCEv2 packet
///
/// Headers are taken by value so the variant fields can be masked to
/// ones without touching the caller's copies; `rest` is every byte after
/// the BTH (extended headers and payload), which is invariant in full.
/// The headers' length and checksum fields must already hold their final
/// values.
pub fn compute_icrc(
    ipv4: &Ipv4Header,
    udp: &UdpHeader,
    bth: &BaseTransportHeader,
    rest: &[u8],
) -> Result<u32> {
    let mut masked_ip = *ipv4;
    masked_ip.tos = 0xFF;
    masked_ip.ttl = 0xFF;
    masked_ip.checksum = 0xFFFF;

    let mut masked_udp = *udp;
    masked_udp.checksum = 0xFFFF;

    let mut bth_bytes = bth.encode()?;
    bth_bytes[4] = 0xFF; // fecn/becn/resv6

    let mut hasher = Hasher::new();
    hasher.update(&[0xFF; 8]);
    hasher.update(&masked_ip.encode());
    hasher.update(&masked_udp.encode());
    hasher.update(&bth_bytes);
    hasher.update(rest);
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn headers() -> (Ipv4Header, UdpHeader, BaseTransportHeader) {
        let mut ip = Ipv4Header::new(
            Ipv4Addr::new(10, 10, 10, 1),
            Ipv4Addr::new(10, 10, 10, 255),
        );
        ip.total_length = 76;
        ip.update_checksum();

        let mut udp = UdpHeader::new(59000);
        udp.length = 56;

        let bth = BaseTransportHeader::new(10, 399, 3_515_407);
        (ip, udp, bth)
    }

    #[test]
    fn test_trailer_byte_order() {
        let trailer = IcrcTrailer::new(0x0403_0201);
        assert_eq!(trailer.encode(), vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(IcrcTrailer::decode(&[0x01, 0x02, 0x03, 0x04]).unwrap(), trailer);
    }

    #[test]
    fn test_deterministic() {
        let (ip, udp, bth) = headers();
        let a = compute_icrc(&ip, &udp, &bth, b"lala").unwrap();
        let b = compute_icrc(&ip, &udp, &bth, b"lala").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_variant_fields_do_not_affect_icrc() {
        let (ip, udp, bth) = headers();
        let base = compute_icrc(&ip, &udp, &bth, b"lala").unwrap();

        // A router decrementing TTL (and fixing the checksum) must not
        // invalidate the ICRC.
        let mut routed = ip;
        routed.ttl = 63;
        routed.update_checksum();
        assert_eq!(compute_icrc(&routed, &udp, &bth, b"lala").unwrap(), base);

        let mut ecn_marked = bth;
        ecn_marked.fecn = true;
        assert_eq!(compute_icrc(&ip, &udp, &ecn_marked, b"lala").unwrap(), base);
    }

    #[test]
    fn test_invariant_fields_do_affect_icrc() {
        let (ip, udp, bth) = headers();
        let base = compute_icrc(&ip, &udp, &bth, b"lala").unwrap();

        let mut other_psn = bth;
        other_psn.psn += 1;
        assert_ne!(compute_icrc(&ip, &udp, &other_psn, b"lala").unwrap(), base);

        assert_ne!(compute_icrc(&ip, &udp, &bth, b"lalb").unwrap(), base);
    }
}
