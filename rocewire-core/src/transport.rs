//! Link-layer transmission
//!
//! A [`LinkTransport`] accepts a fully-encoded Ethernet frame and writes
//! it to the wire, at most once. There is no retry logic here: a failed
//! send surfaces to the caller, and any reliability belongs to a higher
//! layer. Implementations must serialize writes on a shared handle so
//! two concurrent sends cannot interleave partial frames.

use crate::{Error, Interface, Result};
use pnet_datalink::{Channel, DataLinkSender};
use std::sync::Mutex;
use tracing::{debug, info};

/// Abstraction over a raw link-layer send operation
///
/// `send` returns the number of bytes written on success. A short write
/// reported by the OS surfaces as [`Error::TransportTruncated`]; an
/// invalid or down handle as [`Error::TransportUnavailable`].
pub trait LinkTransport {
    /// Write one fully-encoded frame to the wire, at most once
    fn send(&self, frame: &[u8]) -> Result<usize>;
}

/// [`LinkTransport`] backed by a `pnet_datalink` Ethernet channel
///
/// The sender is held behind a mutex so only one send is in flight per
/// handle at a time; the lock is held for the duration of a single
/// `send` and nothing else.
pub struct DatalinkTransport {
    interface: String,
    sender: Mutex<Box<dyn DataLinkSender>>,
}

impl DatalinkTransport {
    /// Open a transmit channel on a resolved interface
    pub fn open(interface: &Interface) -> Result<Self> {
        if !interface.is_up {
            return Err(Error::unavailable(format!(
                "interface {} is down",
                interface.name
            )));
        }

        let iface = pnet_datalink::interfaces()
            .into_iter()
            .find(|i| i.name == interface.name)
            .ok_or_else(|| Error::InterfaceNotFound(interface.name.clone()))?;

        let tx = match pnet_datalink::channel(&iface, Default::default()) {
            Ok(Channel::Ethernet(tx, _rx)) => tx,
            Ok(_) => return Err(Error::unavailable("unsupported channel type")),
            Err(e) => {
                return Err(Error::unavailable(format!(
                    "failed to open channel on {}: {}",
                    interface.name, e
                )))
            }
        };

        info!("Opened link-layer transport on {}", interface.name);

        Ok(Self {
            interface: interface.name.clone(),
            sender: Mutex::new(tx),
        })
    }

    /// Name of the interface this transport is bound to
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl LinkTransport for DatalinkTransport {
    fn send(&self, frame: &[u8]) -> Result<usize> {
        let mut tx = self
            .sender
            .lock()
            .map_err(|_| Error::unavailable("transport lock poisoned"))?;

        tx.send_to(frame, None)
            .ok_or_else(|| Error::unavailable("send queue closed"))?
            .map_err(Error::Io)?;

        debug!("Sent {} bytes on {}", frame.len(), self.interface);

        // pnet's sender either writes the whole frame or errors; a short
        // write cannot be observed through this backend.
        Ok(frame.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Test transport that records frames and can simulate short writes
    struct MockTransport {
        frames: StdMutex<Vec<Vec<u8>>>,
        short_write: Option<usize>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                frames: StdMutex::new(Vec::new()),
                short_write: None,
            }
        }

        fn short(written: usize) -> Self {
            Self {
                frames: StdMutex::new(Vec::new()),
                short_write: Some(written),
            }
        }
    }

    impl LinkTransport for MockTransport {
        fn send(&self, frame: &[u8]) -> Result<usize> {
            if let Some(written) = self.short_write {
                return Err(Error::TransportTruncated {
                    written,
                    expected: frame.len(),
                });
            }
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(frame.len())
        }
    }

    #[test]
    fn test_mock_send() {
        let transport = MockTransport::new();
        let sent = transport.send(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(sent, 4);
        assert_eq!(transport.frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_short_write_surfaces() {
        let transport = MockTransport::short(2);
        let err = transport.send(&[0u8; 90]).unwrap_err();
        match err {
            Error::TransportTruncated { written, expected } => {
                assert_eq!(written, 2);
                assert_eq!(expected, 90);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_trait_object() {
        // Callers hold transports as trait objects; make sure that works.
        let transport: Box<dyn LinkTransport> = Box::new(MockTransport::new());
        assert_eq!(transport.send(&[1, 2, 3]).unwrap(), 3);
    }
}
