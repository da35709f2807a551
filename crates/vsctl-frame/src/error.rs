/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Fewer than five header bytes were available.
    #[error("short frame header ({received} of 5 bytes)")]
    ShortHeader { received: usize },

    /// The body does not match the length declared in the header.
    #[error("frame length mismatch (declared {declared} payload bytes, body has {actual} bytes)")]
    LengthMismatch { declared: usize, actual: usize },

    /// The trailing checksum byte does not match the frame contents.
    #[error("invalid checksum (computed 0x{computed:02X}, received 0x{received:02X})")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// The command-type byte is not part of the protocol.
    #[error("unknown command type 0x{0:02X}")]
    UnknownCommand(u8),

    /// The payload does not fit the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
