//! IPv4 header (RFC 791, no options)

use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use rocewire_core::{Error, Result};
use std::net::Ipv4Addr;

/// IP protocol number for UDP
pub const IPPROTO_UDP: u8 = 17;

/// IPv4 flags (3 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpFlags {
    /// Reserved bit (must be zero on transmit)
    pub reserved: bool,
    /// Don't Fragment
    pub dont_fragment: bool,
    /// More Fragments
    pub more_fragments: bool,
}

impl IpFlags {
    /// Don't Fragment set, nothing else
    pub const DONT_FRAGMENT: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: true,
        more_fragments: false,
    };

    /// Pack into the low 3 bits of a byte
    pub fn to_u8(self) -> u8 {
        (self.reserved as u8) << 2 | (self.dont_fragment as u8) << 1 | self.more_fragments as u8
    }

    /// Unpack from the low 3 bits of a byte
    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            reserved: value & 0b100 != 0,
            dont_fragment: value & 0b010 != 0,
            more_fragments: value & 0b001 != 0,
        }
    }
}

/// 20-byte IPv4 header
///
/// `total_length` and `checksum` are resolved by the packet stack at
/// finalize time; the constructor leaves them zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    /// Version (always 4)
    pub version: u8,
    /// Header length in 32-bit words (always 5: no options)
    pub ihl: u8,
    /// Type of Service / DSCP+ECN
    pub tos: u8,
    /// Total length of header plus everything after it
    pub total_length: u16,
    /// Identification
    pub identification: u16,
    /// Flags
    pub flags: IpFlags,
    /// Fragment offset in 8-byte blocks (13 bits)
    pub fragment_offset: u16,
    /// Time to Live
    pub ttl: u8,
    /// Encapsulated protocol number
    pub protocol: u8,
    /// Header checksum over the 20 header bytes
    pub checksum: u16,
    /// Source address
    pub source: Ipv4Addr,
    /// Destination address
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Header size on the wire
    pub const SIZE: usize = 20;

    /// Create a UDP-carrying header with conventional defaults
    /// (TTL 64, Don't Fragment, zero length and checksum)
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr) -> Self {
        Self {
            version: 4,
            ihl: 5,
            tos: 0,
            total_length: 0,
            identification: 0,
            flags: IpFlags::DONT_FRAGMENT,
            fragment_offset: 0,
            ttl: 64,
            protocol: IPPROTO_UDP,
            checksum: 0,
            source,
            destination,
        }
    }

    /// Set the Time to Live
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the identification field
    pub fn with_identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: IpFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Recompute the header checksum from the current field values
    ///
    /// The checksum field is zeroed before summing, per RFC 791.
    pub fn update_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.encode());
    }

    /// Serialize to 20 bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_u8((self.version << 4) | (self.ihl & 0x0F));
        buf.put_u8(self.tos);
        buf.put_u16(self.total_length);
        buf.put_u16(self.identification);
        buf.put_u16(((self.flags.to_u8() as u16) << 13) | (self.fragment_offset & 0x1FFF));
        buf.put_u8(self.ttl);
        buf.put_u8(self.protocol);
        buf.put_u16(self.checksum);
        buf.put_slice(&self.source.octets());
        buf.put_slice(&self.destination.octets());
        buf.to_vec()
    }

    /// Parse from the first 20 bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                needed: Self::SIZE,
                got: data.len(),
            });
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(Error::decoding(format!("not an IPv4 header: version {version}")));
        }

        let flags_and_offset = u16::from_be_bytes([data[6], data[7]]);

        Ok(Self {
            version,
            ihl: data[0] & 0x0F,
            tos: data[1],
            total_length: u16::from_be_bytes([data[2], data[3]]),
            identification: u16::from_be_bytes([data[4], data[5]]),
            flags: IpFlags::from_u8((flags_and_offset >> 13) as u8),
            fragment_offset: flags_and_offset & 0x1FFF,
            ttl: data[8],
            protocol: data[9],
            checksum: u16::from_be_bytes([data[10], data[11]]),
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::verify_checksum;

    fn sample() -> Ipv4Header {
        Ipv4Header::new(
            Ipv4Addr::new(10, 10, 10, 1),
            Ipv4Addr::new(10, 10, 10, 255),
        )
    }

    #[test]
    fn test_defaults() {
        let header = sample();
        assert_eq!(header.version, 4);
        assert_eq!(header.ihl, 5);
        assert_eq!(header.ttl, 64);
        assert_eq!(header.protocol, IPPROTO_UDP);
        assert!(header.flags.dont_fragment);
    }

    #[test]
    fn test_encode_layout() {
        let mut header = sample();
        header.total_length = 76;
        let bytes = header.encode();

        assert_eq!(bytes.len(), Ipv4Header::SIZE);
        assert_eq!(bytes[0], 0x45);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 76);
        // DF flag in the top bits of the flags/offset word
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 0x4000);
        assert_eq!(bytes[9], IPPROTO_UDP);
        assert_eq!(&bytes[12..16], &[10, 10, 10, 1]);
        assert_eq!(&bytes[16..20], &[10, 10, 10, 255]);
    }

    #[test]
    fn test_checksum_self_verifies() {
        let mut header = sample();
        header.total_length = 76;
        header.update_checksum();

        assert_ne!(header.checksum, 0);
        assert!(verify_checksum(&header.encode()));
    }

    #[test]
    fn test_roundtrip() {
        let mut header = sample().with_ttl(3).with_identification(0x1234);
        header.total_length = 76;
        header.update_checksum();

        let decoded = Ipv4Header::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_decode_rejects_version() {
        let mut bytes = sample().encode();
        bytes[0] = 0x65; // version 6
        assert!(matches!(
            Ipv4Header::decode(&bytes),
            Err(Error::Decoding(_))
        ));
    }

    #[test]
    fn test_flags_roundtrip() {
        for value in 0..8 {
            assert_eq!(IpFlags::from_u8(value).to_u8(), value);
        }
    }
}
