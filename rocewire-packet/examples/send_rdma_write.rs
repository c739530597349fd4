//! Example: sending an RDMA WRITE Only packet
//!
//! Builds the full Ethernet/IPv4/UDP/BTH/RETH frame for a one-shot RDMA
//! write and injects it on a named interface. Raw link-layer access
//! requires elevated privilege; run with an interface name:
//!
//! ```text
//! sudo cargo run --example send_rdma_write -- ens2f0
//! ```

use std::net::Ipv4Addr;

use rocewire_core::{DatalinkTransport, Interface, LinkTransport, MacAddr};
use rocewire_packet::bth::{opcode, BaseTransportHeader};
use rocewire_packet::ethernet::EthernetHeader;
use rocewire_packet::ip::Ipv4Header;
use rocewire_packet::reth::RdmaExtendedHeader;
use rocewire_packet::stack::{Layer, PacketStack};
use rocewire_packet::udp::UdpHeader;

fn main() -> rocewire_core::Result<()> {
    let name = std::env::args()
        .nth(1)
        .expect("usage: send_rdma_write <interface>");

    let iface = Interface::by_name(&name)?;
    let src_mac = iface.mac_address;
    let dst_mac: MacAddr = "b8:ce:f6:04:6c:05".parse()?;
    let src_ip = iface.ipv4().unwrap_or(Ipv4Addr::new(10, 10, 10, 1));
    let dst_ip = Ipv4Addr::new(10, 10, 10, 255);

    let mut stack = PacketStack::new();
    stack
        .append(Layer::Ethernet(EthernetHeader::new(dst_mac, src_mac)))?
        .append(Layer::Ipv4(Ipv4Header::new(src_ip, dst_ip)))?
        .append(Layer::Udp(UdpHeader::new(59000)))?
        .append(Layer::Bth(
            BaseTransportHeader::new(opcode::RC_RDMA_WRITE_ONLY, 399, 3_515_407)
                .with_migration(true)
                .with_ack_request(true),
        ))?
        .append(Layer::Reth(RdmaExtendedHeader::new(
            93_882_802_875_152,
            394_756,
            16,
        )))?
        .set_payload_padded(b"lala".to_vec(), 16)?;
    stack.finalize()?;

    let frame = stack.encode()?;
    let transport = DatalinkTransport::open(&iface)?;
    let sent = transport.send(&frame)?;

    println!("Sent {} bytes on {}", sent, iface);
    println!("ICRC: {:#010x}", stack.icrc().unwrap().value);
    Ok(())
}
