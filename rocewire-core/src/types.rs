//! Common types used throughout rocewire

use std::fmt;
use std::str::FromStr;

/// An IEEE 802 48-bit hardware address, stored in transmission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The all-ones link broadcast address.
    pub const fn broadcast() -> Self {
        Self([0xff; 6])
    }

    /// The all-zero placeholder address.
    pub const fn zero() -> Self {
        Self([0x00; 6])
    }

    /// Borrows the octets for writing into a frame buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// True when the group bit (least significant bit of the first
    /// octet) is set.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for octet in self.0 {
            write!(f, "{sep}{octet:02x}")?;
            sep = ":";
        }
        Ok(())
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    /// Parses the colon-separated form, e.g. `b8:ce:f6:04:6b:d0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for slot in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| crate::Error::decoding(format!("MAC too short: {s:?}")))?;
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::decoding(format!("bad MAC octet {part:?}")))?;
        }
        if parts.next().is_some() {
            return Err(crate::Error::decoding(format!("MAC too long: {s:?}")));
        }
        Ok(MacAddr(octets))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_display() {
        let mac = MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6b, 0xd0]);
        assert_eq!(mac.to_string(), "b8:ce:f6:04:6b:d0");
    }

    #[test]
    fn test_mac_from_str() {
        let mac: MacAddr = "b8:ce:f6:04:6c:05".parse().unwrap();
        assert_eq!(mac.octets(), [0xb8, 0xce, 0xf6, 0x04, 0x6c, 0x05]);
    }

    #[test]
    fn test_mac_from_str_invalid() {
        assert!("b8:ce:f6:04:6c".parse::<MacAddr>().is_err());
        assert!("b8:ce:f6:04:6c:zz".parse::<MacAddr>().is_err());
        assert!("b8:ce:f6:04:6c:05:00".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_multicast() {
        assert!(MacAddr::broadcast().is_multicast());
        assert!(!MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6b, 0xd0]).is_multicast());
    }
}
