#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use vsctl_session::{BackoffConfig, SessionConfig};

/// One request frame as the device received it.
#[derive(Debug, Clone)]
pub struct Request {
    pub command: u8,
    pub payload: Vec<u8>,
    pub raw: Vec<u8>,
}

impl Request {
    pub fn checksum_ok(&self) -> bool {
        let (body, sum) = self.raw.split_at(self.raw.len() - 1);
        sum[0] == body[1..].iter().fold(0u8, |a, b| a.wrapping_add(*b))
    }
}

/// What the device does after receiving a request.
#[derive(Debug, Clone)]
pub enum Reply {
    Frame(u8, Vec<u8>),
    Raw(Vec<u8>),
    /// Send these bytes, then hang up.
    RawThenClose(Vec<u8>),
    Close,
    Silent,
    /// Send a frame after holding the reply back for a while.
    Delayed(Duration, u8, Vec<u8>),
}

pub const ERROR: u8 = 0x00;
pub const WRITE_RESPONSE: u8 = 0x03;
pub const READ_RESPONSE: u8 = 0x05;

pub fn ack() -> Reply {
    Reply::Frame(WRITE_RESPONSE, Vec::new())
}

pub fn value(byte: u8) -> Reply {
    Reply::Frame(READ_RESPONSE, vec![0x34, 0x00, byte])
}

/// Encode a response the way the projector does (reserved bytes zeroed).
pub fn response_frame(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![command, 0x00, 0x00];
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(payload);
    let sum = frame[1..].iter().fold(0u8, |a, b| a.wrapping_add(*b));
    frame.push(sum);
    frame
}

type Handler = dyn Fn(&Request) -> Reply + Send + Sync;

/// Scripted projector on 127.0.0.1.
pub struct MockDevice {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Request>>>,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockDevice {
    pub async fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Reply + Send + Sync + 'static,
    {
        Self::spawn_at("127.0.0.1:0", handler).await
    }

    /// Listen on a fixed address, e.g. one a session is already dialing.
    pub async fn spawn_at<F>(addr: &str, handler: F) -> Self
    where
        F: Fn(&Request) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler: Arc<Handler> = Arc::new(handler);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let task = {
            let requests = Arc::clone(&requests);
            let connections = Arc::clone(&connections);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(stream, Arc::clone(&handler), Arc::clone(&requests)));
                }
            })
        };

        Self {
            addr,
            requests,
            connections,
            task,
        }
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub async fn wait_for_connections(&self, count: usize, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            while self.connections() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {count} connections, saw {}", self.connections()));
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut stream: TcpStream, handler: Arc<Handler>, requests: Arc<Mutex<Vec<Request>>>) {
    loop {
        let mut head = [0u8; 5];
        if stream.read_exact(&mut head).await.is_err() {
            return;
        }
        let len = u16::from_le_bytes([head[3], head[4]]) as usize;
        let mut body = vec![0u8; len + 1];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let mut raw = head.to_vec();
        raw.extend_from_slice(&body);
        let request = Request {
            command: head[0],
            payload: body[..len].to_vec(),
            raw,
        };

        let reply = handler(&request);
        requests.lock().unwrap().push(request);

        let written = match reply {
            Reply::Frame(command, payload) => stream.write_all(&response_frame(command, &payload)).await,
            Reply::Raw(bytes) => stream.write_all(&bytes).await,
            Reply::RawThenClose(bytes) => {
                let _ = stream.write_all(&bytes).await;
                return;
            }
            Reply::Close => return,
            Reply::Silent => Ok(()),
            Reply::Delayed(delay, command, payload) => {
                tokio::time::sleep(delay).await;
                stream.write_all(&response_frame(command, &payload)).await
            }
        };
        if written.is_err() {
            return;
        }
    }
}

/// Session config with short delays so reconnect tests run quickly.
pub fn fast_config(address: String) -> SessionConfig {
    SessionConfig::new(address).with_backoff(BackoffConfig {
        min: Duration::from_millis(20),
        max: Duration::from_millis(100),
        factor: 2.0,
    })
}

/// Address on 127.0.0.1 where nothing is listening.
pub async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}
