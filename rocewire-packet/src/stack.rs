//! Layered packet assembly
//!
//! A [`PacketStack`] owns an ordered list of header layers plus an
//! opaque payload, and resolves every field that depends on the full
//! packet (UDP length, IPv4 total length, IPv4 header checksum, and
//! the trailing invariant CRC) in dependency order at finalize time.
//!
//! The stack is single-use and moves through two states:
//! `Building -> Finalized`. Layers may only be appended while building;
//! `finalize` is idempotent; `encode` is only valid after `finalize`
//! and may be repeated. There is no way back to `Building`: callers
//! construct a new stack per outbound packet.

use crate::bth::{opcode, BaseTransportHeader};
use crate::ethernet::EthernetHeader;
use crate::icrc::{compute_icrc, IcrcTrailer};
use crate::ip::Ipv4Header;
use crate::reth::RdmaExtendedHeader;
use crate::udp::UdpHeader;
use rocewire_core::{Error, Result};

/// One typed header layer of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Ethernet II header
    Ethernet(EthernetHeader),
    /// IPv4 header
    Ipv4(Ipv4Header),
    /// UDP header
    Udp(UdpHeader),
    /// InfiniBand Base Transport Header
    Bth(BaseTransportHeader),
    /// RDMA Extended Transport Header
    Reth(RdmaExtendedHeader),
}

impl Layer {
    /// Fixed encoded size of this layer
    pub fn wire_len(&self) -> usize {
        match self {
            Layer::Ethernet(_) => EthernetHeader::SIZE,
            Layer::Ipv4(_) => Ipv4Header::SIZE,
            Layer::Udp(_) => UdpHeader::SIZE,
            Layer::Bth(_) => BaseTransportHeader::SIZE,
            Layer::Reth(_) => RdmaExtendedHeader::SIZE,
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Layer::Ethernet(h) => Ok(h.encode()),
            Layer::Ipv4(h) => Ok(h.encode()),
            Layer::Udp(h) => Ok(h.encode()),
            Layer::Bth(h) => h.encode(),
            Layer::Reth(h) => Ok(h.encode()),
        }
    }
}

/// How the trailing ICRC is produced at finalize time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcMode {
    /// Compute the real invariant CRC
    #[default]
    Computed,
    /// Write a zero trailer (malformed-packet testing)
    Zeroed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Building,
    Finalized,
}

/// Ordered composition of header layers into one wire frame
#[derive(Debug, Clone)]
pub struct PacketStack {
    layers: Vec<Layer>,
    payload: Vec<u8>,
    icrc: IcrcTrailer,
    crc_mode: CrcMode,
    state: State,
}

impl PacketStack {
    /// Create an empty stack in the building state
    pub fn new() -> Self {
        Self {
            layers: Vec::with_capacity(5),
            payload: Vec::new(),
            icrc: IcrcTrailer::new(0),
            crc_mode: CrcMode::default(),
            state: State::Building,
        }
    }

    /// Select how the ICRC trailer is produced
    pub fn with_crc_mode(mut self, mode: CrcMode) -> Self {
        self.crc_mode = mode;
        self
    }

    /// Append a layer to the tail
    ///
    /// No validation happens until [`finalize`](Self::finalize). Fails
    /// with [`Error::AlreadyFinalized`] once the stack has left the
    /// building state.
    pub fn append(&mut self, layer: Layer) -> Result<&mut Self> {
        if self.state != State::Building {
            return Err(Error::AlreadyFinalized);
        }
        self.layers.push(layer);
        Ok(self)
    }

    /// Set the opaque payload carried after the last header
    pub fn set_payload(&mut self, data: Vec<u8>) -> Result<&mut Self> {
        if self.state != State::Building {
            return Err(Error::AlreadyFinalized);
        }
        self.payload = data;
        Ok(self)
    }

    /// Set the payload, zero-padded to a declared DMA length
    pub fn set_payload_padded(&mut self, mut data: Vec<u8>, dma_length: usize) -> Result<&mut Self> {
        if data.len() < dma_length {
            data.resize(dma_length, 0);
        }
        self.set_payload(data)
    }

    /// Resolve all cross-layer length and checksum fields
    ///
    /// In dependency order: UDP length, IPv4 total length, IPv4 header
    /// checksum, then the ICRC over the invariant fields. Fails with
    /// [`Error::IncompleteStack`] if the Ethernet, IPv4, UDP, or BTH
    /// layer is missing (or a RETH-carrying opcode has no RETH), and
    /// with [`Error::InvalidStack`] if the layers are out of wire order
    /// or a RETH accompanies an opcode that does not carry one. Any
    /// failure leaves the stack unchanged. Idempotent once finalized.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state == State::Finalized {
            return Ok(());
        }

        let eth_idx = self.position("Ethernet", |l| matches!(l, Layer::Ethernet(_)))?;
        let ip_idx = self.position("IPv4", |l| matches!(l, Layer::Ipv4(_)))?;
        let udp_idx = self.position("UDP", |l| matches!(l, Layer::Udp(_)))?;
        let bth_idx = self.position("BTH", |l| matches!(l, Layer::Bth(_)))?;

        // A frame only decodes at fixed offsets, so the layers must sit
        // in wire order and the opcode must agree with the presence of
        // a RETH right behind the BTH.
        if !(eth_idx < ip_idx && ip_idx < udp_idx && udp_idx < bth_idx) {
            return Err(Error::InvalidStack("layers out of wire order"));
        }
        let bth = match self.layers[bth_idx] {
            Layer::Bth(h) => h,
            _ => unreachable!(),
        };
        let reth_idx = self.layers.iter().position(|l| matches!(l, Layer::Reth(_)));
        match (opcode::has_reth(bth.opcode), reth_idx) {
            (true, None) => return Err(Error::IncompleteStack("RETH")),
            (false, Some(_)) => {
                return Err(Error::InvalidStack(
                    "RETH present without an RDMA read/write opcode",
                ))
            }
            (true, Some(idx)) if idx != bth_idx + 1 => {
                return Err(Error::InvalidStack("RETH must immediately follow the BTH"))
            }
            _ => {}
        }

        // UDP length covers the UDP header plus everything after it,
        // ICRC trailer included. Both length fields are 16 bits on the
        // wire; an oversized payload must fail, not wrap.
        let after_udp: usize = self.layers[udp_idx + 1..]
            .iter()
            .map(Layer::wire_len)
            .sum::<usize>()
            + self.payload.len()
            + IcrcTrailer::SIZE;
        let udp_length = fit_u16(UdpHeader::SIZE + after_udp)?;

        let after_ip: usize = self.layers[ip_idx + 1..]
            .iter()
            .map(Layer::wire_len)
            .sum::<usize>()
            + self.payload.len()
            + IcrcTrailer::SIZE;
        let total_length = fit_u16(Ipv4Header::SIZE + after_ip)?;

        // Resolve into copies first so a failure cannot leave the stack
        // half-updated.
        let mut udp = match self.layers[udp_idx] {
            Layer::Udp(h) => h,
            _ => unreachable!(),
        };
        udp.length = udp_length;

        let mut ipv4 = match self.layers[ip_idx] {
            Layer::Ipv4(h) => h,
            _ => unreachable!(),
        };
        ipv4.total_length = total_length;
        ipv4.update_checksum();

        let icrc = match self.crc_mode {
            CrcMode::Computed => {
                let mut rest = Vec::new();
                for layer in &self.layers[bth_idx + 1..] {
                    rest.extend_from_slice(&layer.encode()?);
                }
                rest.extend_from_slice(&self.payload);
                IcrcTrailer::new(compute_icrc(&ipv4, &udp, &bth, &rest)?)
            }
            CrcMode::Zeroed => IcrcTrailer::new(0),
        };

        self.layers[udp_idx] = Layer::Udp(udp);
        self.layers[ip_idx] = Layer::Ipv4(ipv4);
        self.icrc = icrc;
        self.state = State::Finalized;
        Ok(())
    }

    /// Serialize the finalized stack into one byte buffer
    ///
    /// Layers are concatenated in insertion order, followed by the
    /// payload and the ICRC trailer. Fails with [`Error::NotFinalized`]
    /// before [`finalize`](Self::finalize); repeatable afterwards.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.state != State::Finalized {
            return Err(Error::NotFinalized);
        }

        let len: usize = self.layers.iter().map(Layer::wire_len).sum::<usize>()
            + self.payload.len()
            + IcrcTrailer::SIZE;
        let mut frame = Vec::with_capacity(len);
        for layer in &self.layers {
            frame.extend_from_slice(&layer.encode()?);
        }
        frame.extend_from_slice(&self.payload);
        frame.extend_from_slice(&self.icrc.encode());
        Ok(frame)
    }

    /// Parse a wire frame back into a finalized stack
    ///
    /// Layers are sliced at their fixed offsets; the BTH opcode decides
    /// whether a RETH follows. Everything between the last transport
    /// header and the 4-byte trailer is payload. Fails with
    /// [`Error::Truncated`] if the buffer cannot hold the fixed-length
    /// layers plus a zero-length payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let fixed = EthernetHeader::SIZE
            + Ipv4Header::SIZE
            + UdpHeader::SIZE
            + BaseTransportHeader::SIZE
            + IcrcTrailer::SIZE;
        if data.len() < fixed {
            return Err(Error::Truncated {
                needed: fixed,
                got: data.len(),
            });
        }

        let mut layers = Vec::with_capacity(5);
        let mut offset = 0;

        let eth = EthernetHeader::decode(&data[offset..])?;
        layers.push(Layer::Ethernet(eth));
        offset += EthernetHeader::SIZE;

        let ipv4 = Ipv4Header::decode(&data[offset..])?;
        layers.push(Layer::Ipv4(ipv4));
        offset += Ipv4Header::SIZE;

        let udp = UdpHeader::decode(&data[offset..])?;
        layers.push(Layer::Udp(udp));
        offset += UdpHeader::SIZE;

        let bth = BaseTransportHeader::decode(&data[offset..])?;
        layers.push(Layer::Bth(bth));
        offset += BaseTransportHeader::SIZE;

        if opcode::has_reth(bth.opcode) {
            let needed = fixed + RdmaExtendedHeader::SIZE;
            if data.len() < needed {
                return Err(Error::Truncated {
                    needed,
                    got: data.len(),
                });
            }
            let reth = RdmaExtendedHeader::decode(&data[offset..])?;
            layers.push(Layer::Reth(reth));
            offset += RdmaExtendedHeader::SIZE;
        }

        let trailer_at = data.len() - IcrcTrailer::SIZE;
        let payload = data[offset..trailer_at].to_vec();
        let icrc = IcrcTrailer::decode(&data[trailer_at..])?;

        Ok(Self {
            layers,
            payload,
            icrc,
            crc_mode: CrcMode::default(),
            state: State::Finalized,
        })
    }

    /// The layers in insertion order
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The opaque payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The ICRC trailer, once the stack is finalized
    pub fn icrc(&self) -> Option<IcrcTrailer> {
        match self.state {
            State::Finalized => Some(self.icrc),
            State::Building => None,
        }
    }

    /// Whether the stack has been finalized
    pub fn is_finalized(&self) -> bool {
        self.state == State::Finalized
    }

    /// The IPv4 layer, if present
    pub fn ipv4(&self) -> Option<&Ipv4Header> {
        self.layers.iter().find_map(|l| match l {
            Layer::Ipv4(h) => Some(h),
            _ => None,
        })
    }

    /// The UDP layer, if present
    pub fn udp(&self) -> Option<&UdpHeader> {
        self.layers.iter().find_map(|l| match l {
            Layer::Udp(h) => Some(h),
            _ => None,
        })
    }

    /// The BTH layer, if present
    pub fn bth(&self) -> Option<&BaseTransportHeader> {
        self.layers.iter().find_map(|l| match l {
            Layer::Bth(h) => Some(h),
            _ => None,
        })
    }

    /// The RETH layer, if present
    pub fn reth(&self) -> Option<&RdmaExtendedHeader> {
        self.layers.iter().find_map(|l| match l {
            Layer::Reth(h) => Some(h),
            _ => None,
        })
    }

    fn position<F>(&self, name: &'static str, pred: F) -> Result<usize>
    where
        F: Fn(&Layer) -> bool,
    {
        self.layers
            .iter()
            .position(pred)
            .ok_or(Error::IncompleteStack(name))
    }
}

impl Default for PacketStack {
    fn default() -> Self {
        Self::new()
    }
}

fn fit_u16(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::Encoding {
        value: len as u64,
        width: 16,
    })
}
