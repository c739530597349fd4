//! Internet checksum (RFC 1071)
//!
//! Used for the IPv4 header checksum and, optionally, the UDP checksum.
//! RoCEv2 senders conventionally transmit a zero UDP checksum (the
//! invariant CRC masks the field), so the transport checksum here is an
//! opt-in helper rather than part of stack finalization.

/// Compute the 16-bit one's-complement Internet checksum over `data`
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u16::from_be_bytes([word[0], word[1]]) as u32;
    }
    if let Some(&odd) = words.remainder().first() {
        sum += (odd as u32) << 8;
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !sum as u16
}

/// Compute a UDP checksum over the IPv4 pseudo-header plus `segment`
///
/// `segment` is the UDP header (checksum field zero) followed by the
/// payload; `protocol` is the IP protocol number (17 for UDP).
pub fn transport_checksum(
    src_ip: &[u8; 4],
    dst_ip: &[u8; 4],
    protocol: u8,
    segment: &[u8],
) -> u16 {
    let mut buf = Vec::with_capacity(12 + segment.len());
    buf.extend_from_slice(src_ip);
    buf.extend_from_slice(dst_ip);
    buf.push(0);
    buf.push(protocol);
    buf.extend_from_slice(&(segment.len() as u16).to_be_bytes());
    buf.extend_from_slice(segment);

    internet_checksum(&buf)
}

/// Verify a buffer that includes its own checksum field
///
/// Summing a correctly checksummed header yields the one's-complement
/// zero sentinel.
pub fn verify_checksum(data: &[u8]) -> bool {
    let folded = internet_checksum(data);
    folded == 0 || folded == 0xFFFF
}
