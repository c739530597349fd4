//! Packet construction and parsing library for rocewire
//!
//! This crate encodes and decodes the layered headers of a RoCEv2
//! (RDMA-over-Converged-Ethernet v2) packet (Ethernet, IPv4, UDP, the
//! InfiniBand Base Transport Header, the RDMA Extended Transport Header,
//! and the trailing invariant CRC) and composes them into complete wire
//! frames.
//!
//! # Architecture
//!
//! - [`bits`] - Sub-byte field packing in network bit order
//! - [`checksum`] - Internet checksum (RFC 1071) utilities
//! - [`ethernet`] - Ethernet II header
//! - [`ip`] - IPv4 header with checksum calculation
//! - [`udp`] - UDP header with the RoCEv2 well-known port
//! - [`bth`] - InfiniBand Base Transport Header and RC opcodes
//! - [`reth`] - RDMA Extended Transport Header
//! - [`icrc`] - Invariant CRC computation and trailer
//! - [`stack`] - Ordered layer composition and finalization
//!
//! # Quick start
//!
//! Build an RDMA WRITE Only frame and encode it:
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use rocewire_core::MacAddr;
//! use rocewire_packet::bth::{opcode, BaseTransportHeader};
//! use rocewire_packet::ethernet::EthernetHeader;
//! use rocewire_packet::ip::Ipv4Header;
//! use rocewire_packet::reth::RdmaExtendedHeader;
//! use rocewire_packet::stack::{Layer, PacketStack};
//! use rocewire_packet::udp::UdpHeader;
//!
//! let mut stack = PacketStack::new();
//! stack
//!     .append(Layer::Ethernet(EthernetHeader::new(
//!         MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6c, 0x05]),
//!         MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6b, 0xd0]),
//!     )))?
//!     .append(Layer::Ipv4(Ipv4Header::new(
//!         Ipv4Addr::new(10, 10, 10, 1),
//!         Ipv4Addr::new(10, 10, 10, 255),
//!     )))?
//!     .append(Layer::Udp(UdpHeader::new(59000)))?
//!     .append(Layer::Bth(
//!         BaseTransportHeader::new(opcode::RC_RDMA_WRITE_ONLY, 399, 3515407)
//!             .with_ack_request(true),
//!     ))?
//!     .append(Layer::Reth(RdmaExtendedHeader::new(93882802875152, 394756, 16)))?
//!     .set_payload_padded(b"lala".to_vec(), 16)?;
//!
//! stack.finalize()?;
//! let frame = stack.encode()?;
//! assert_eq!(frame.len(), 90);
//! # Ok::<(), rocewire_core::Error>(())
//! ```
//!
//! Finalization resolves the UDP length, the IPv4 total length and
//! checksum, and the invariant CRC; `encode` then yields the frame to
//! hand to a `rocewire_core::LinkTransport`. Decoding reverses the
//! process for captured frames.

pub mod bits;
pub mod bth;
pub mod checksum;
pub mod ethernet;
pub mod icrc;
pub mod ip;
pub mod reth;
pub mod stack;
pub mod udp;

// Re-export commonly used types
pub use bth::BaseTransportHeader;
pub use ethernet::EthernetHeader;
pub use icrc::IcrcTrailer;
pub use ip::Ipv4Header;
pub use reth::RdmaExtendedHeader;
pub use stack::{CrcMode, Layer, PacketStack};
pub use udp::UdpHeader;
