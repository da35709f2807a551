//! Command-type codes.
//!
//! The set is closed: a response carrying any other code is a protocol
//! violation and invalidates the connection.

use std::fmt;

/// The leading byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    /// Response: the requested function is currently unavailable on the device.
    Error = 0x00,
    /// Request: simulated remote-control key press.
    WriteKey = 0x02,
    /// Response: acknowledgement of a write or key press.
    WriteResponse = 0x03,
    /// Response: register contents.
    ReadResponse = 0x05,
    /// Request: set a register.
    Write = 0x06,
    /// Request: read a register.
    Read = 0x07,
}

impl CommandType {
    /// Classify a raw command byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Error),
            0x02 => Some(Self::WriteKey),
            0x03 => Some(Self::WriteResponse),
            0x05 => Some(Self::ReadResponse),
            0x06 => Some(Self::Write),
            0x07 => Some(Self::Read),
            _ => None,
        }
    }

    /// The wire value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// True for the codes a client sends.
    pub fn is_request(self) -> bool {
        matches!(self, Self::WriteKey | Self::Write | Self::Read)
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::WriteKey => "WRITE_KEY",
            Self::WriteResponse => "WRITE_RESPONSE",
            Self::ReadResponse => "READ_RESPONSE",
            Self::Write => "WRITE",
            Self::Read => "READ",
        }
    }
}

impl From<CommandType> for u8 {
    fn from(command: CommandType) -> Self {
        command.code()
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.code())
    }
}

/// Returns a human-readable name for a raw command byte.
pub fn command_name(code: u8) -> &'static str {
    CommandType::from_code(code).map_or("UNKNOWN", CommandType::name)
}
