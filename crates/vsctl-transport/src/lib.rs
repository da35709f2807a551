//! TCP transport for projector control links.
//!
//! This is the lowest layer of vsctl. It dials the device with keep-alive
//! enabled and a bounded connect timeout, and exposes the deadline-bounded
//! primitives the exchange layer is built from:
//! - write a whole buffer before a deadline
//! - fill a buffer exactly before a deadline (short reads are errors)
//! - discard stray bytes left over from a desynchronized exchange
//!
//! Everything above this crate talks to a [`DeviceStream`].

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::{with_default_port, DeviceStream, DialConfig, DEFAULT_PORT};
