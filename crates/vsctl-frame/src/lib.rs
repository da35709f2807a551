//! Length-prefixed, checksummed command framing.
//!
//! Every frame on the control link, in both directions, is laid out as:
//! - 1 command-type byte
//! - 2 bytes that are the fixed marker `0x14 0x00` on requests and reserved
//!   on responses
//! - a 2-byte little-endian payload length
//! - the payload
//! - 1 checksum byte: the wrapping sum of every byte after the command byte
//!
//! The codec is pure: it never touches a socket. The session layer reads the
//! 5-byte header and the body separately (they have different deadlines) and
//! hands each part to [`decode_header`] and [`decode_body`].

pub mod codec;
pub mod command;
pub mod error;

pub use codec::{
    checksum, decode_body, decode_frame, decode_header, encode_frame, Frame, FrameHeader,
    HEADER_SIZE, MARKER, MAX_PAYLOAD,
};
pub use command::{command_name, CommandType};
pub use error::{FrameError, Result};
