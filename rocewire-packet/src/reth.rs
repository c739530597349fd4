//! RDMA Extended Transport Header (RETH)
//!
//! Present for RDMA read/write opcodes; carries the remote memory
//! address, protection key, and transfer length.

use bytes::{BufMut, BytesMut};
use rocewire_core::{Error, Result};

/// RDMA Extended Transport Header (16 bytes, all fields big-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdmaExtendedHeader {
    /// Remote virtual address
    pub virtual_address: u64,
    /// Remote key authorizing access to the address
    pub remote_key: u32,
    /// DMA length in bytes
    pub dma_length: u32,
}

impl RdmaExtendedHeader {
    /// Header size on the wire
    pub const SIZE: usize = 16;

    /// Create a new RETH
    pub fn new(virtual_address: u64, remote_key: u32, dma_length: u32) -> Self {
        Self {
            virtual_address,
            remote_key,
            dma_length,
        }
    }

    /// Serialize to 16 bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_u64(self.virtual_address);
        buf.put_u32(self.remote_key);
        buf.put_u32(self.dma_length);
        buf.to_vec()
    }

    /// Parse from the first 16 bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                needed: Self::SIZE,
                got: data.len(),
            });
        }

        Ok(Self {
            virtual_address: u64::from_be_bytes(data[0..8].try_into().unwrap()),
            remote_key: u32::from_be_bytes(data[8..12].try_into().unwrap()),
            dma_length: u32::from_be_bytes(data[12..16].try_into().unwrap()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let reth = RdmaExtendedHeader::new(93_882_802_875_152, 394_756, 16);
        let bytes = reth.encode();

        assert_eq!(bytes.len(), RdmaExtendedHeader::SIZE);
        assert_eq!(&bytes[0..8], &93_882_802_875_152u64.to_be_bytes());
        assert_eq!(&bytes[8..12], &394_756u32.to_be_bytes());
        assert_eq!(&bytes[12..16], &16u32.to_be_bytes());
    }

    #[test]
    fn test_roundtrip() {
        let reth = RdmaExtendedHeader::new(0xDEAD_BEEF_CAFE_F00D, 0x0102_0304, 4096);
        let decoded = RdmaExtendedHeader::decode(&reth.encode()).unwrap();
        assert_eq!(decoded, reth);
    }

    #[test]
    fn test_decode_short() {
        let err = RdmaExtendedHeader::decode(&[0u8; 15]).unwrap_err();
        assert!(matches!(err, Error::Truncated { needed: 16, got: 15 }));
    }
}
