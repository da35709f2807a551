use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use vsctl_session::{exchange, CommandType, ReconnectSignal, SessionError, Timeouts};
use vsctl_transport::{DeviceStream, DialConfig, TransportError};

async fn read_request(stream: &mut TcpStream) {
    let mut head = [0u8; 5];
    stream.read_exact(&mut head).await.unwrap();
    let mut body = vec![0u8; u16::from_le_bytes([head[3], head[4]]) as usize + 1];
    stream.read_exact(&mut body).await.unwrap();
}

/// Device that answers the first request with `reply` and then hangs up.
async fn one_shot_device(reply: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        let _ = stream.write_all(&reply).await;
    });
    addr
}

async fn dial(addr: &str) -> DeviceStream {
    DeviceStream::connect(addr, &DialConfig::default()).await.unwrap()
}

#[tokio::test]
async fn short_header_raises_reconnect_once() {
    let addr = one_shot_device(vec![0x05, 0x00]).await;
    let mut stream = dial(&addr).await;
    let signal = ReconnectSignal::new();

    let err = exchange(
        &mut stream,
        &signal,
        &Timeouts::default(),
        CommandType::Read,
        &[0x34, 0x00, 0x00, 0x14, 0x00],
    )
    .await
    .unwrap_err();

    assert!(
        matches!(err, SessionError::Transport(TransportError::ShortRead { expected: 5, received: 2 })),
        "got {err:?}"
    );
    assert!(!stream.is_trusted());
    assert!(signal.take());
    assert!(!signal.take());
}

#[tokio::test]
async fn truncated_body_times_out_on_body_deadline() {
    // header promises three payload bytes, only one arrives, socket stays open
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        let _ = stream.write_all(&[0x05, 0x00, 0x00, 0x03, 0x00, 0x34]).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
    });

    let mut stream = dial(&addr).await;
    let signal = ReconnectSignal::new();
    let timeouts = Timeouts::default();

    let err = exchange(&mut stream, &signal, &timeouts, CommandType::Read, &[0x34, 0x00, 0x00, 0x14, 0x00])
        .await
        .unwrap_err();

    match err {
        SessionError::Transport(TransportError::Timeout { op, after, transferred }) => {
            assert_eq!(op, "body read");
            assert_eq!(after, timeouts.body);
            assert_eq!(transferred, 1);
        }
        other => panic!("expected body timeout, got {other:?}"),
    }
    assert!(!stream.is_trusted());
    assert!(signal.is_pending());
    device.abort();
}

#[tokio::test]
async fn valid_response_keeps_stream_trusted() {
    let addr = one_shot_device(vec![0x03, 0x00, 0x00, 0x00, 0x00, 0x00]).await;
    let mut stream = dial(&addr).await;
    let signal = ReconnectSignal::new();

    let frame = exchange(
        &mut stream,
        &signal,
        &Timeouts::default(),
        CommandType::Write,
        &[0x34, 0x14, 0x00, 0x01],
    )
    .await
    .unwrap();

    assert_eq!(frame.command, CommandType::WriteResponse);
    assert!(frame.payload.is_empty());
    assert!(stream.is_trusted());
    assert!(!signal.is_pending());
}

#[tokio::test]
async fn unknown_response_command_is_a_frame_error() {
    // 0x09 with a valid checksum over an empty body
    let addr = one_shot_device(vec![0x09, 0x00, 0x00, 0x00, 0x00, 0x00]).await;
    let mut stream = dial(&addr).await;
    let signal = ReconnectSignal::new();

    let err = exchange(&mut stream, &signal, &Timeouts::default(), CommandType::Read, &[0x34])
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Frame(_)), "got {err:?}");
    assert!(!stream.is_trusted());
    assert!(signal.take());
}

#[tokio::test]
async fn chattering_device_cannot_stall_the_drain() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let chunk = [0xAAu8; 1024];
        while stream.write_all(&chunk).await.is_ok() {
            tokio::task::yield_now().await;
        }
    });

    let mut stream = dial(&addr).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let signal = ReconnectSignal::new();
    let timeouts = Timeouts {
        header: Duration::from_millis(200),
        ..Timeouts::default()
    };

    let started = std::time::Instant::now();
    let result = exchange(&mut stream, &signal, &timeouts, CommandType::Read, &[0x34, 0x00, 0x00, 0x11, 0x00]).await;

    assert!(result.is_err(), "got {result:?}");
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "exchange took {:?}",
        started.elapsed()
    );
    assert!(!stream.is_trusted());
    device.abort();
}
