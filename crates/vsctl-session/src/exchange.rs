//! One request/response round trip on a live stream.

use bytes::BytesMut;
use tracing::{debug, trace, warn};
use vsctl_frame::{decode_body, decode_header, encode_frame, CommandType, Frame, HEADER_SIZE};
use vsctl_transport::DeviceStream;

use crate::config::Timeouts;
use crate::error::Result;
use crate::signal::ReconnectSignal;

/// Send one request frame and read back its response.
///
/// The caller must hold exclusive access to `stream` for the whole call.
/// Leftover bytes from an earlier desynchronized exchange are discarded
/// first. Any write, read, deadline or checksum failure marks the stream
/// untrusted and raises `signal` before the error is returned; the stream
/// must not be used again.
pub async fn exchange(
    stream: &mut DeviceStream,
    signal: &ReconnectSignal,
    timeouts: &Timeouts,
    command: CommandType,
    payload: &[u8],
) -> Result<Frame> {
    let mut request = BytesMut::new();
    encode_frame(command, payload, &mut request)?;

    let discarded = stream.drain(timeouts.drain).await;
    if discarded > 0 {
        debug!(peer = %stream.peer_addr(), discarded, "discarded stray bytes before exchange");
    }

    match round_trip(stream, timeouts, &request).await {
        Ok(response) => {
            trace!(
                peer = %stream.peer_addr(),
                request = %command,
                response = %response.command,
                len = response.payload.len(),
                "exchange complete"
            );
            Ok(response)
        }
        Err(err) => {
            warn!(peer = %stream.peer_addr(), request = %command, %err, "exchange failed, requesting reconnect");
            stream.mark_untrusted();
            signal.raise();
            Err(err)
        }
    }
}

async fn round_trip(stream: &mut DeviceStream, timeouts: &Timeouts, request: &[u8]) -> Result<Frame> {
    stream.write_all(request, timeouts.write).await?;

    let mut head = [0u8; HEADER_SIZE];
    stream
        .read_exact(&mut head, timeouts.header, "header read")
        .await?;
    let header = decode_header(&head)?;

    let mut body = vec![0u8; header.body_len()];
    stream
        .read_exact(&mut body, timeouts.body, "body read")
        .await?;
    let payload = decode_body(&header, &body)?;

    Ok(Frame {
        command: header.command_type()?,
        payload,
    })
}
