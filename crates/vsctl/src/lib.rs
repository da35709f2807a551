//! Control projectors over their proprietary binary TCP protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP dialing and deadline-bounded socket I/O
//! - [`frame`]: checksummed request/response framing
//! - [`session`]: self-healing session with typed register accessors
//! - [`device`]: named projector functions (power, mute, volume, ...)

pub mod device;

/// Re-export transport types.
pub mod transport {
    pub use vsctl_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use vsctl_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use vsctl_session::*;
}
