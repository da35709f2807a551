//! Typed register accessors.
//!
//! Each accessor builds a request around a 16-bit register address, sends it
//! through the session, and checks that the response has exactly the shape
//! its access kind allows. The error command is reported as
//! [`SessionError::FunctionDisabled`]; every other mismatch is a protocol
//! violation that also drops the connection.

use bytes::Bytes;
use vsctl_frame::{CommandType, Frame};

use crate::error::{Result, SessionError};
use crate::session::Session;

/// Sub-address byte leading every request payload.
pub const SUB_ADDRESS: u8 = 0x34;

/// Payload of a write or key request: sub-address, address (big endian), value.
pub fn write_request(address: u16, value: u8) -> [u8; 4] {
    let [hi, lo] = address.to_be_bytes();
    [SUB_ADDRESS, hi, lo, value]
}

/// Payload of a read request: sub-address, two zero bytes, address (big endian).
pub fn read_request(address: u16) -> [u8; 5] {
    let [hi, lo] = address.to_be_bytes();
    [SUB_ADDRESS, 0x00, 0x00, hi, lo]
}

impl Session {
    /// Set a register. Expects an empty write acknowledgement.
    pub async fn write(&self, address: u16, value: u8) -> Result<()> {
        self.dispatch_checked(CommandType::Write, &write_request(address, value), expect_ack)
            .await
    }

    /// Send a remote-control key event. Same contract as [`Session::write`].
    pub async fn write_key(&self, address: u16, value: u8) -> Result<()> {
        self.dispatch_checked(CommandType::WriteKey, &write_request(address, value), expect_ack)
            .await
    }

    /// Read a one-byte register.
    pub async fn read(&self, address: u16) -> Result<u8> {
        let payload = self.read_shaped(address, Some(3)).await?;
        Ok(payload[2])
    }

    /// Read a signed 16-bit register (little endian).
    pub async fn read_2_bytes(&self, address: u16) -> Result<i16> {
        let payload = self.read_shaped(address, Some(4)).await?;
        Ok(i16::from_le_bytes([payload[2], payload[3]]))
    }

    /// Read a register of any width and return the raw payload.
    pub async fn read_n_bytes(&self, address: u16) -> Result<Bytes> {
        self.read_shaped(address, None).await
    }

    async fn read_shaped(&self, address: u16, len: Option<usize>) -> Result<Bytes> {
        self.dispatch_checked(CommandType::Read, &read_request(address), |response| {
            expect_read(response, len)
        })
        .await
    }
}

fn expect_ack(response: Frame) -> Result<()> {
    match response.command {
        CommandType::Error => Err(SessionError::FunctionDisabled),
        CommandType::WriteResponse if response.payload.is_empty() => Ok(()),
        command => Err(unexpected(command, &response.payload)),
    }
}

fn expect_read(response: Frame, len: Option<usize>) -> Result<Bytes> {
    match response.command {
        CommandType::Error => Err(SessionError::FunctionDisabled),
        CommandType::ReadResponse if len.is_none_or(|len| response.payload.len() == len) => {
            Ok(response.payload)
        }
        command => Err(unexpected(command, &response.payload)),
    }
}

fn unexpected(command: CommandType, payload: &[u8]) -> SessionError {
    SessionError::UnexpectedResponse {
        command,
        payload: payload.to_vec(),
    }
}
