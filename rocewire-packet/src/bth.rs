//! InfiniBand Base Transport Header (BTH)
//!
//! Fixed 12 bytes carrying the per-packet transport metadata: opcode,
//! partition key, destination queue pair, and packet sequence number.
//! Several fields are narrower than a byte; the layout below is the wire
//! order, bit widths summing to whole bytes:
//!
//! ```text
//! opcode(8) | se(1) mig(1) pad(2) tver(4) | pkey(16)
//! fecn(1) becn(1) resv6(6) | dqpn(24)
//! ackreq(1) resv7(7) | psn(24)
//! ```

use crate::bits::{BitReader, BitWriter};
use rocewire_core::{Error, Result};

/// Default partition key: the full default partition
pub const DEFAULT_PKEY: u16 = 0xFFFF;

/// Reliable Connection opcodes (subset)
///
/// The opcode determines which extended headers follow the BTH.
pub mod opcode {
    /// RC SEND Only
    pub const RC_SEND_ONLY: u8 = 4;
    /// RC RDMA WRITE First
    pub const RC_RDMA_WRITE_FIRST: u8 = 6;
    /// RC RDMA WRITE Only
    pub const RC_RDMA_WRITE_ONLY: u8 = 10;
    /// RC RDMA WRITE Only with Immediate
    pub const RC_RDMA_WRITE_ONLY_IMM: u8 = 11;
    /// RC RDMA READ Request
    pub const RC_RDMA_READ_REQUEST: u8 = 12;
    /// RC Acknowledge
    pub const RC_ACKNOWLEDGE: u8 = 17;

    /// Whether a RETH follows the BTH for this opcode
    pub fn has_reth(op: u8) -> bool {
        matches!(
            op,
            RC_RDMA_WRITE_FIRST | RC_RDMA_WRITE_ONLY | RC_RDMA_WRITE_ONLY_IMM
                | RC_RDMA_READ_REQUEST
        )
    }
}

/// Base Transport Header (12 bytes)
///
/// Reserved fields (`resv6`, `resv7`) are carried opaquely: decoders
/// record whatever is on the wire and encoders write it back unchanged,
/// so captured traffic round-trips bit-exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseTransportHeader {
    /// Operation code
    pub opcode: u8,
    /// Solicited event
    pub solicited: bool,
    /// Migration request
    pub migration: bool,
    /// Pad count: bytes of padding after the payload (2 bits)
    pub pad_count: u8,
    /// Transport header version (4 bits)
    pub version: u8,
    /// Partition key
    pub pkey: u16,
    /// Forward ECN
    pub fecn: bool,
    /// Backward ECN
    pub becn: bool,
    /// Reserved (6 bits)
    pub resv6: u8,
    /// Destination queue pair number (24 bits)
    pub dqpn: u32,
    /// Acknowledge request
    pub ack_request: bool,
    /// Reserved (7 bits)
    pub resv7: u8,
    /// Packet sequence number (24 bits)
    pub psn: u32,
}

impl BaseTransportHeader {
    /// Header size on the wire
    pub const SIZE: usize = 12;

    /// Create a header with the default partition key, version 0, and
    /// all flag/reserved bits clear
    pub fn new(opcode: u8, dqpn: u32, psn: u32) -> Self {
        Self {
            opcode,
            solicited: false,
            migration: false,
            pad_count: 0,
            version: 0,
            pkey: DEFAULT_PKEY,
            fecn: false,
            becn: false,
            resv6: 0,
            dqpn,
            ack_request: false,
            resv7: 0,
            psn,
        }
    }

    /// Set the solicited-event bit
    pub fn with_solicited(mut self, solicited: bool) -> Self {
        self.solicited = solicited;
        self
    }

    /// Set the migration-request bit
    pub fn with_migration(mut self, migration: bool) -> Self {
        self.migration = migration;
        self
    }

    /// Set the pad count (2-bit field; out-of-range values are
    /// reported at encode time)
    pub fn with_pad_count(mut self, pad_count: u8) -> Self {
        self.pad_count = pad_count;
        self
    }

    /// Set the partition key
    pub fn with_pkey(mut self, pkey: u16) -> Self {
        self.pkey = pkey;
        self
    }

    /// Set the acknowledge-request bit
    pub fn with_ack_request(mut self, ack_request: bool) -> Self {
        self.ack_request = ack_request;
        self
    }

    /// Serialize to 12 bytes
    ///
    /// Fails with [`Error::Encoding`] if a field value exceeds its
    /// declared bit width (`pad_count` > 3, `version` > 15, `dqpn` or
    /// `psn` > 2^24-1, or a reserved field out of range).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = BitWriter::with_capacity(Self::SIZE);
        w.put(self.opcode as u64, 8)?;
        w.put(self.solicited as u64, 1)?;
        w.put(self.migration as u64, 1)?;
        w.put(self.pad_count as u64, 2)?;
        w.put(self.version as u64, 4)?;
        w.put(self.pkey as u64, 16)?;
        w.put(self.fecn as u64, 1)?;
        w.put(self.becn as u64, 1)?;
        w.put(self.resv6 as u64, 6)?;
        w.put(self.dqpn as u64, 24)?;
        w.put(self.ack_request as u64, 1)?;
        w.put(self.resv7 as u64, 7)?;
        w.put(self.psn as u64, 24)?;

        debug_assert!(w.is_aligned() && w.bit_len() == Self::SIZE * 8);
        Ok(w.into_bytes())
    }

    /// Parse from the first 12 bytes of `data`, preserving reserved bits
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                needed: Self::SIZE,
                got: data.len(),
            });
        }

        let mut r = BitReader::new(&data[..Self::SIZE]);
        Ok(Self {
            opcode: r.get(8)? as u8,
            solicited: r.get(1)? != 0,
            migration: r.get(1)? != 0,
            pad_count: r.get(2)? as u8,
            version: r.get(4)? as u8,
            pkey: r.get(16)? as u16,
            fecn: r.get(1)? != 0,
            becn: r.get(1)? != 0,
            resv6: r.get(6)? as u8,
            dqpn: r.get(24)? as u32,
            ack_request: r.get(1)? != 0,
            resv7: r.get(7)? as u8,
            psn: r.get(24)? as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The RDMA WRITE Only header from a captured RoCEv2 exchange
    fn sample() -> BaseTransportHeader {
        BaseTransportHeader::new(opcode::RC_RDMA_WRITE_ONLY, 399, 3_515_407)
            .with_migration(true)
            .with_ack_request(true)
    }

    #[test]
    fn test_encode_is_12_bytes() {
        assert_eq!(sample().encode().unwrap().len(), BaseTransportHeader::SIZE);
    }

    #[test]
    fn test_encode_layout() {
        let bytes = sample().encode().unwrap();

        assert_eq!(bytes[0], 10); // opcode
        assert_eq!(bytes[1], 0b0100_0000); // se=0 mig=1 pad=00 tver=0000
        assert_eq!(&bytes[2..4], &[0xFF, 0xFF]); // pkey
        assert_eq!(bytes[4], 0); // fecn/becn/resv6
        assert_eq!(&bytes[5..8], &[0x00, 0x01, 0x8F]); // dqpn 399
        assert_eq!(bytes[8], 0b1000_0000); // ackreq=1 resv7=0
        assert_eq!(&bytes[9..12], &[0x35, 0xA4, 0x0F]); // psn 3515407
    }

    #[test]
    fn test_roundtrip() {
        let header = sample();
        let decoded = BaseTransportHeader::decode(&header.encode().unwrap()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_reserved_bits_preserved() {
        let mut header = sample();
        header.resv6 = 0b10_1010;
        header.resv7 = 0b101_0101;

        let decoded = BaseTransportHeader::decode(&header.encode().unwrap()).unwrap();
        assert_eq!(decoded.resv6, 0b10_1010);
        assert_eq!(decoded.resv7, 0b101_0101);
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_pad_count_out_of_range() {
        let header = sample().with_pad_count(4);
        assert!(matches!(
            header.encode(),
            Err(Error::Encoding { value: 4, width: 2 })
        ));
    }

    #[test]
    fn test_psn_out_of_range() {
        let mut header = sample();
        header.psn = 1 << 24;
        assert!(matches!(header.encode(), Err(Error::Encoding { .. })));
    }

    #[test]
    fn test_decode_short() {
        let err = BaseTransportHeader::decode(&[0u8; 11]).unwrap_err();
        assert!(matches!(err, Error::Truncated { needed: 12, got: 11 }));
    }

    #[test]
    fn test_has_reth() {
        assert!(opcode::has_reth(opcode::RC_RDMA_WRITE_ONLY));
        assert!(opcode::has_reth(opcode::RC_RDMA_READ_REQUEST));
        assert!(!opcode::has_reth(opcode::RC_SEND_ONLY));
        assert!(!opcode::has_reth(opcode::RC_ACKNOWLEDGE));
    }
}
