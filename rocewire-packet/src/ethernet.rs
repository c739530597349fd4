//! Ethernet II header

use bytes::{BufMut, BytesMut};
use rocewire_core::{Error, MacAddr, Result};

/// EtherType for IPv4 (0x0800)
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// Ethernet II header (14 bytes, no FCS)
///
/// Header only: the payload belongs to the packet stack, which needs to
/// slice layers at fixed offsets when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType of the encapsulated protocol
    pub ethertype: u16,
}

impl EthernetHeader {
    /// Header size on the wire
    pub const SIZE: usize = 14;

    /// Create a header carrying IPv4
    pub fn new(destination: MacAddr, source: MacAddr) -> Self {
        Self {
            destination,
            source,
            ethertype: ETHERTYPE_IPV4,
        }
    }

    /// Override the EtherType
    pub fn with_ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    /// Serialize to 14 bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_slice(self.destination.as_bytes());
        buf.put_slice(self.source.as_bytes());
        buf.put_u16(self.ethertype);
        buf.to_vec()
    }

    /// Parse from the first 14 bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                needed: Self::SIZE,
                got: data.len(),
            });
        }

        let mut destination = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        let mut source = [0u8; 6];
        source.copy_from_slice(&data[6..12]);

        Ok(Self {
            destination: MacAddr(destination),
            source: MacAddr(source),
            ethertype: u16::from_be_bytes([data[12], data[13]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let src = MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6b, 0xd0]);
        let dst = MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6c, 0x05]);
        let bytes = EthernetHeader::new(dst, src).encode();

        assert_eq!(bytes.len(), EthernetHeader::SIZE);
        assert_eq!(&bytes[0..6], dst.as_bytes());
        assert_eq!(&bytes[6..12], src.as_bytes());
        assert_eq!(u16::from_be_bytes([bytes[12], bytes[13]]), ETHERTYPE_IPV4);
    }

    #[test]
    fn test_roundtrip() {
        let header = EthernetHeader::new(
            MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6c, 0x05]),
            MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6b, 0xd0]),
        );
        let decoded = EthernetHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_decode_short() {
        let err = EthernetHeader::decode(&[0u8; 13]).unwrap_err();
        assert!(matches!(err, Error::Truncated { needed: 14, got: 13 }));
    }
}
