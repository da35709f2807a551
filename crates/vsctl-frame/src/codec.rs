use bytes::{BufMut, Bytes, BytesMut};

use crate::command::CommandType;
use crate::error::{FrameError, Result};

/// Frame header: command (1) + marker/reserved (2) + length (2) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Fixed bytes following the command type on every request.
pub const MARKER: [u8; 2] = [0x14, 0x00];

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// A parsed 5-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Raw command byte. Classified only after the body has been validated.
    pub command: u8,
    /// Marker bytes on requests, reserved bytes on responses.
    pub reserved: [u8; 2],
    /// Declared payload length.
    pub payload_len: u16,
}

impl FrameHeader {
    /// Bytes that follow the header: payload plus checksum.
    pub fn body_len(&self) -> usize {
        self.payload_len as usize + 1
    }

    /// Classify the command byte.
    pub fn command_type(&self) -> Result<CommandType> {
        CommandType::from_code(self.command).ok_or(FrameError::UnknownCommand(self.command))
    }

    fn checksummed_bytes(&self) -> [u8; 4] {
        let len = self.payload_len.to_le_bytes();
        [self.reserved[0], self.reserved[1], len[0], len[1]]
    }
}

/// A complete decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: CommandType,
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(command: CommandType, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + 1
    }
}

/// Wrapping 8-bit sum over every byte of every part.
pub fn checksum<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> u8 {
    parts
        .into_iter()
        .flatten()
        .fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Encode a request frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────┬─────────────┬──────────┬──────────────┬──────────┐
/// │ Command │ Marker (2B) │ Length   │ Payload      │ Checksum │
/// │ (1B)    │ 0x14 0x00   │ (2B LE)  │ (Length B)   │ (1B)     │
/// └─────────┴─────────────┴──────────┴──────────────┴──────────┘
///             └──────────── summed into checksum ──┘
/// ```
pub fn encode_frame(command: CommandType, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let start = dst.len();
    dst.reserve(HEADER_SIZE + payload.len() + 1);
    dst.put_u8(command.code());
    dst.put_slice(&MARKER);
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    let sum = checksum([&dst[start + 1..]]);
    dst.put_u8(sum);
    Ok(())
}

/// Parse the fixed 5-byte header.
///
/// Extra bytes past the header are ignored; fewer than five is an error.
pub fn decode_header(src: &[u8]) -> Result<FrameHeader> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::ShortHeader {
            received: src.len(),
        });
    }
    Ok(FrameHeader {
        command: src[0],
        reserved: [src[1], src[2]],
        payload_len: u16::from_le_bytes([src[3], src[4]]),
    })
}

/// Validate a body (payload + checksum) against its header and strip the checksum.
///
/// `body` must be exactly `header.body_len()` bytes.
pub fn decode_body(header: &FrameHeader, body: &[u8]) -> Result<Bytes> {
    if body.len() != header.body_len() {
        return Err(FrameError::LengthMismatch {
            declared: header.payload_len as usize,
            actual: body.len(),
        });
    }
    let (payload, trailer) = body.split_at(body.len() - 1);
    let computed = checksum([&header.checksummed_bytes()[..], payload]);
    if computed != trailer[0] {
        return Err(FrameError::ChecksumMismatch {
            computed,
            received: trailer[0],
        });
    }
    Ok(Bytes::copy_from_slice(payload))
}

/// Decode one complete captured frame.
///
/// The slice must hold exactly one frame; trailing or missing bytes
/// invalidate it.
pub fn decode_frame(src: &[u8]) -> Result<Frame> {
    let header = decode_header(src)?;
    let payload = decode_body(&header, &src[HEADER_SIZE..])?;
    Ok(Frame {
        command: header.command_type()?,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(command: CommandType, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_frame(command, payload, &mut buf).unwrap();
        buf
    }

    #[test]
    fn mute_on_write_matches_device_capture() {
        let buf = encoded(CommandType::Write, &[0x34, 0x14, 0x00, 0x01]);
        let sum = [0x14u8, 0x00, 0x04, 0x00, 0x34, 0x14, 0x00, 0x01]
            .iter()
            .fold(0u8, |a, b| a.wrapping_add(*b));
        assert_eq!(
            buf.as_ref(),
            &[0x06, 0x14, 0x00, 0x04, 0x00, 0x34, 0x14, 0x00, 0x01, sum]
        );
        assert_eq!(sum, 0x61);
    }

    #[test]
    fn remote_key_matches_device_capture() {
        let buf = encoded(CommandType::WriteKey, &[0x34, 0x02, 0x04, 0x0F]);
        assert_eq!(
            buf.as_ref(),
            &[0x02, 0x14, 0x00, 0x04, 0x00, 0x34, 0x02, 0x04, 0x0F, 0x61]
        );
    }

    #[test]
    fn encode_decode_roundtrip() {
        let cases: [(CommandType, &[u8]); 4] = [
            (CommandType::Read, &[0x34, 0x00, 0x00, 0x11, 0x00]),
            (CommandType::ReadResponse, &[0x34, 0x00, 0x01]),
            (CommandType::WriteResponse, &[]),
            (CommandType::Error, &[0xFF; 300]),
        ];
        for (command, payload) in cases {
            let buf = encoded(command, payload);
            assert_eq!(buf.len(), HEADER_SIZE + payload.len() + 1);

            let frame = decode_frame(&buf).unwrap();
            assert_eq!(frame.command, command);
            assert_eq!(frame.payload.as_ref(), payload);
            assert_eq!(frame.wire_size(), buf.len());
        }
    }

    #[test]
    fn any_single_byte_flip_after_command_is_rejected() {
        let buf = encoded(CommandType::ReadResponse, &[0x34, 0x00, 0x01, 0x7F]);
        for index in 1..buf.len() {
            let mut corrupted = buf.to_vec();
            corrupted[index] ^= 0x01;
            let err = decode_frame(&corrupted).unwrap_err();
            assert!(
                matches!(
                    err,
                    FrameError::ChecksumMismatch { .. } | FrameError::LengthMismatch { .. }
                ),
                "byte {index} flip produced {err:?}"
            );
        }
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum([&[0xFFu8, 0x02][..]]), 0x01);
        assert_eq!(checksum([&[0x80u8][..], &[0x80u8][..]]), 0x00);
        assert_eq!(checksum(Vec::<&[u8]>::new()), 0x00);
    }

    #[test]
    fn decode_header_short() {
        let err = decode_header(&[0x05, 0x14, 0x00]).unwrap_err();
        assert_eq!(err, FrameError::ShortHeader { received: 3 });
    }

    #[test]
    fn decode_header_little_endian_length() {
        let header = decode_header(&[0x05, 0x00, 0x00, 0x03, 0x01]).unwrap();
        assert_eq!(header.payload_len, 0x0103);
        assert_eq!(header.body_len(), 0x0104);
        assert_eq!(header.command_type().unwrap(), CommandType::ReadResponse);
    }

    #[test]
    fn decode_body_checks_length_exactly() {
        let header = decode_header(&[0x05, 0x00, 0x00, 0x03, 0x00]).unwrap();
        let err = decode_body(&header, &[0x34, 0x00, 0x01]).unwrap_err();
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                declared: 3,
                actual: 3
            }
        );
    }

    #[test]
    fn decode_body_covers_reserved_and_length_bytes() {
        let header = decode_header(&[0x05, 0x14, 0x00, 0x03, 0x00]).unwrap();
        let payload = [0x34, 0x00, 0x01];
        let good = checksum([&[0x14u8, 0x00, 0x03, 0x00][..], &payload[..]]);
        let mut body = payload.to_vec();
        body.push(good);
        assert_eq!(decode_body(&header, &body).unwrap().as_ref(), &payload);

        let payload_only = checksum([&payload[..]]);
        body[3] = payload_only;
        assert!(matches!(
            decode_body(&header, &body),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn unknown_command_rejected_after_valid_body() {
        let mut buf = encoded(CommandType::ReadResponse, &[0x01]).to_vec();
        buf[0] = 0x09;
        assert_eq!(
            decode_frame(&buf).unwrap_err(),
            FrameError::UnknownCommand(0x09)
        );
    }

    #[test]
    fn oversized_payload_rejected() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let mut buf = BytesMut::new();
        let err = encode_frame(CommandType::Write, &payload, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_appends_to_existing_buffer() {
        let mut buf = BytesMut::new();
        encode_frame(CommandType::Read, &[0x01], &mut buf).unwrap();
        encode_frame(CommandType::Read, &[0x02], &mut buf).unwrap();
        let first = decode_frame(&buf[..7]).unwrap();
        let second = decode_frame(&buf[7..]).unwrap();
        assert_eq!(first.payload.as_ref(), &[0x01]);
        assert_eq!(second.payload.as_ref(), &[0x02]);
    }
}
