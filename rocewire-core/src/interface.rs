//! Network interface handle resolution
//!
//! Interface *enumeration* is out of scope for this crate: callers name
//! the interface they want (typically from configuration) and get back a
//! resolved handle carrying the attributes the codec and transport need.

use crate::{Error, MacAddr};
use std::fmt;

/// A resolved network interface handle
#[derive(Debug, Clone)]
pub struct Interface {
    /// Interface name (e.g., "eth0", "ens2f0")
    pub name: String,
    /// Interface index
    pub index: u32,
    /// MAC address
    pub mac_address: MacAddr,
    /// Is interface up?
    pub is_up: bool,
}

impl Interface {
    /// Resolve an interface by name
    ///
    /// Raw link-layer access typically requires elevated privilege; this
    /// only resolves attributes and does not open a channel.
    pub fn by_name(name: &str) -> Result<Self, Error> {
        let iface = pnet_datalink::interfaces()
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))?;

        let mac_bytes = if let Some(mac) = iface.mac {
            [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]
        } else {
            [0, 0, 0, 0, 0, 0]
        };

        Ok(Self {
            name: iface.name.clone(),
            index: iface.index,
            mac_address: MacAddr(mac_bytes),
            is_up: iface.is_up(),
        })
    }

    /// Get the first IPv4 address assigned to this interface, if any
    pub fn ipv4(&self) -> Option<std::net::Ipv4Addr> {
        let iface = pnet_datalink::interfaces()
            .into_iter()
            .find(|i| i.name == self.name)?;

        for ip_network in iface.ips {
            if let ipnetwork::IpNetwork::V4(ipv4_net) = ip_network {
                return Some(ipv4_net.ip());
            }
        }

        None
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.mac_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_interface() {
        let err = Interface::by_name("no-such-interface-0").unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(_)));
    }

    #[test]
    fn test_display() {
        let iface = Interface {
            name: "ens2f0".to_string(),
            index: 4,
            mac_address: MacAddr([0xb8, 0xce, 0xf6, 0x04, 0x6b, 0xd0]),
            is_up: true,
        };
        assert_eq!(iface.to_string(), "ens2f0 (b8:ce:f6:04:6b:d0)");
    }
}
