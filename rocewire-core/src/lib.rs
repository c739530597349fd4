//! rocewire core library
//!
//! This crate provides the error type, common address types, and the
//! link-layer transport abstraction shared by the rocewire workspace.
//! The wire codec itself lives in the `rocewire-packet` crate.

pub mod error;
pub mod interface;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use interface::Interface;
pub use transport::{DatalinkTransport, LinkTransport};
pub use types::MacAddr;
