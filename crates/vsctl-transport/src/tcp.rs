use std::io::ErrorKind;
use std::net::{Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{Result, TransportError};

/// TCP port the device listens on when none is given.
pub const DEFAULT_PORT: u16 = 4661;

const DRAIN_CHUNK_SIZE: usize = 256;

/// Dial parameters for a device connection.
#[derive(Debug, Clone)]
pub struct DialConfig {
    /// Upper bound for resolving and connecting. Default: 5 s.
    pub connect_timeout: Duration,
    /// Enable TCP keep-alive on the socket. Default: on.
    pub keepalive: bool,
    /// Disable Nagle's algorithm. Default: on.
    pub nodelay: bool,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            keepalive: true,
            nodelay: true,
        }
    }
}

/// A connected device stream with deadline-bounded I/O.
///
/// The stream carries a trust flag. Once an exchange on it has failed the
/// byte stream can no longer be assumed to be aligned on frame boundaries,
/// so the owner marks it untrusted and never reuses it.
#[derive(Debug)]
pub struct DeviceStream {
    inner: TcpStream,
    peer: SocketAddr,
    trusted: bool,
}

impl DeviceStream {
    /// Resolve `addr` and connect to the first candidate that accepts.
    ///
    /// `addr` is `host:port`; a bare host gets [`DEFAULT_PORT`]. The whole
    /// attempt, resolution included, is bounded by `config.connect_timeout`.
    pub async fn connect(addr: &str, config: &DialConfig) -> Result<Self> {
        tokio::time::timeout(config.connect_timeout, dial(addr, config))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                addr: addr.to_string(),
                after: config.connect_timeout,
            })?
    }

    /// Write the whole buffer before `deadline` elapses.
    pub async fn write_all(&mut self, buf: &[u8], deadline: Duration) -> Result<()> {
        match tokio::time::timeout(deadline, self.inner.write_all(buf)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(TransportError::Io(err)),
            Err(_) => Err(TransportError::Timeout {
                op: "write",
                after: deadline,
                transferred: 0,
            }),
        }
    }

    /// Fill `buf` completely before `deadline` elapses.
    ///
    /// A peer close before the buffer is full is a [`TransportError::ShortRead`].
    /// `op` names the read in timeout errors.
    pub async fn read_exact(
        &mut self,
        buf: &mut [u8],
        deadline: Duration,
        op: &'static str,
    ) -> Result<()> {
        let mut filled = 0usize;
        let outcome = tokio::time::timeout(deadline, fill(&mut self.inner, buf, &mut filled)).await;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                op,
                after: deadline,
                transferred: filled,
            }),
        }
    }

    /// Discard whatever is already buffered on the socket.
    ///
    /// The whole drain ends once `window` has elapsed, even if the peer keeps
    /// sending. A failed read or EOF ends it earlier. Returns the number of
    /// bytes discarded.
    pub async fn drain(&mut self, window: Duration) -> usize {
        let deadline = Instant::now() + window;
        let mut scratch = [0u8; DRAIN_CHUNK_SIZE];
        let mut discarded = 0usize;
        loop {
            match tokio::time::timeout_at(deadline, self.inner.read(&mut scratch)).await {
                Ok(Ok(n)) if n > 0 => discarded += n,
                _ => break,
            }
        }
        if discarded > 0 {
            trace!(peer = %self.peer, discarded, "drained stray bytes");
        }
        discarded
    }

    /// Shut down the write half and drop the connection.
    pub async fn close(mut self) {
        if let Err(err) = self.inner.shutdown().await {
            trace!(peer = %self.peer, %err, "shutdown on close failed");
        }
        debug!(peer = %self.peer, "connection closed");
    }

    /// Address of the connected device.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// False once an exchange on this stream has failed.
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Flag the stream as no longer usable for exchanges.
    pub fn mark_untrusted(&mut self) {
        self.trusted = false;
    }
}

/// Append [`DEFAULT_PORT`] to `addr` unless it already names a port.
pub fn with_default_port(addr: &str) -> String {
    if addr.parse::<SocketAddr>().is_ok() {
        return addr.to_string();
    }
    if addr.parse::<Ipv6Addr>().is_ok() {
        return format!("[{addr}]:{DEFAULT_PORT}");
    }
    match addr.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => addr.to_string(),
        _ => format!("{addr}:{DEFAULT_PORT}"),
    }
}

async fn dial(addr: &str, config: &DialConfig) -> Result<DeviceStream> {
    let target = with_default_port(addr);
    let candidates: Vec<SocketAddr> = lookup_host(target.as_str())
        .await
        .map_err(|source| TransportError::Resolve {
            addr: target.clone(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for candidate in candidates {
        match connect_one(candidate, config).await {
            Ok(inner) => {
                debug!(peer = %candidate, "connected");
                return Ok(DeviceStream {
                    inner,
                    peer: candidate,
                    trusted: true,
                });
            }
            Err(err) => {
                trace!(peer = %candidate, %err, "connect candidate failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        addr: target,
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::NotFound, "address resolved to no candidates")
        }),
    })
}

async fn connect_one(addr: SocketAddr, config: &DialConfig) -> std::io::Result<TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_keepalive(config.keepalive)?;
    let stream = socket.connect(addr).await?;
    stream.set_nodelay(config.nodelay)?;
    Ok(stream)
}

async fn fill(stream: &mut TcpStream, buf: &mut [u8], filled: &mut usize) -> Result<()> {
    while *filled < buf.len() {
        match stream.read(&mut buf[*filled..]).await {
            Ok(0) => {
                return Err(TransportError::ShortRead {
                    expected: buf.len(),
                    received: *filled,
                })
            }
            Ok(n) => *filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    async fn pair() -> (DeviceStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let cfg = DialConfig::default();
        let (client, accepted) = tokio::join!(
            DeviceStream::connect(&addr, &cfg),
            listener.accept()
        );
        (client.unwrap(), accepted.unwrap().0)
    }

    #[test]
    fn default_port_is_appended_only_when_missing() {
        assert_eq!(with_default_port("10.0.0.5"), "10.0.0.5:4661");
        assert_eq!(with_default_port("10.0.0.5:23"), "10.0.0.5:23");
        assert_eq!(with_default_port("projector.lan"), "projector.lan:4661");
        assert_eq!(with_default_port("projector.lan:9000"), "projector.lan:9000");
        assert_eq!(with_default_port("::1"), "[::1]:4661");
        assert_eq!(with_default_port("[::1]:23"), "[::1]:23");
    }

    #[tokio::test]
    async fn write_and_read_exact_roundtrip() {
        let (mut client, mut server) = pair().await;
        assert!(client.is_trusted());

        client
            .write_all(b"ping", Duration::from_secs(1))
            .await
            .unwrap();
        let mut got = [0u8; 4];
        server.read_exact(&mut got).await.unwrap();
        assert_eq!(&got, b"ping");

        server.write_all(b"pong!").await.unwrap();
        let mut reply = [0u8; 5];
        client
            .read_exact(&mut reply, Duration::from_secs(1), "reply")
            .await
            .unwrap();
        assert_eq!(&reply, b"pong!");
    }

    #[tokio::test]
    async fn read_exact_reports_short_read_on_close() {
        let (mut client, mut server) = pair().await;
        server.write_all(&[0x05, 0x14]).await.unwrap();
        drop(server);

        let mut head = [0u8; 5];
        let err = client
            .read_exact(&mut head, Duration::from_secs(1), "header")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortRead {
                expected: 5,
                received: 2
            }
        ));
    }

    #[tokio::test]
    async fn read_exact_times_out_with_partial_count() {
        let (mut client, mut server) = pair().await;
        server.write_all(&[0x05]).await.unwrap();

        let mut head = [0u8; 5];
        let err = client
            .read_exact(&mut head, Duration::from_millis(50), "header")
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(
            err,
            TransportError::Timeout {
                op: "header",
                transferred: 1,
                ..
            }
        ));
        drop(server);
    }

    #[tokio::test]
    async fn drain_discards_stray_bytes() {
        let (mut client, mut server) = pair().await;
        server.write_all(b"stale-response").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let discarded = client.drain(Duration::from_millis(20)).await;
        assert_eq!(discarded, b"stale-response".len());
        assert_eq!(client.drain(Duration::from_millis(5)).await, 0);
    }

    #[tokio::test]
    async fn drain_is_bounded_while_peer_keeps_sending() {
        let (mut client, mut server) = pair().await;
        let flood = tokio::spawn(async move {
            let chunk = [0xAAu8; 64];
            while server.write_all(&chunk).await.is_ok() {
                tokio::task::yield_now().await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = std::time::Instant::now();
        let discarded = client.drain(Duration::from_millis(30)).await;
        assert!(discarded > 0);
        assert!(
            started.elapsed() < Duration::from_millis(500),
            "drain took {:?}",
            started.elapsed()
        );

        flood.abort();
    }

    #[tokio::test]
    async fn connect_refused_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = DeviceStream::connect(&addr, &DialConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn untrusted_flag_sticks() {
        let (mut client, _server) = pair().await;
        client.mark_untrusted();
        assert!(!client.is_trusted());
        assert_eq!(client.peer_addr().ip().to_string(), "127.0.0.1");
        client.close().await;
    }
}
