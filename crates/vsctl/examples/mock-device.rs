//! Simulated projector: keeps a register map in memory and answers the
//! binary control protocol over TCP.
//!
//! Run with:
//!   cargo run --example mock-device -- 127.0.0.1:4661
//!
//! In another terminal:
//!   cargo run -- status --addr 127.0.0.1:4661
//!   cargo run -- power --addr 127.0.0.1:4661 on

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use vsctl::device::register;
use vsctl::frame::{checksum, decode_body, decode_header, CommandType, HEADER_SIZE};

#[derive(Default)]
struct Registers {
    bytes: HashMap<u16, u8>,
    powered: bool,
}

impl Registers {
    fn handle(&mut self, command: u8, payload: &[u8]) -> (CommandType, Vec<u8>) {
        match (CommandType::from_code(command), payload) {
            (Some(CommandType::Write), &[0x34, hi, lo, value]) => {
                self.write(u16::from_be_bytes([hi, lo]), value);
                (CommandType::WriteResponse, Vec::new())
            }
            (Some(CommandType::WriteKey), &[0x34, _, _, _]) => (CommandType::WriteResponse, Vec::new()),
            (Some(CommandType::Read), &[0x34, 0x00, 0x00, hi, lo]) => self.read(u16::from_be_bytes([hi, lo])),
            _ => (CommandType::Error, Vec::new()),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            register::POWER_ON => self.powered = true,
            register::POWER_OFF => self.powered = false,
            register::VOLUME_SET => {
                self.bytes.insert(register::VOLUME, value);
            }
            _ => {
                self.bytes.insert(address, value);
            }
        }
    }

    fn read(&self, address: u16) -> (CommandType, Vec<u8>) {
        let data: Vec<u8> = match address {
            register::POWER_STATE => vec![u8::from(self.powered)],
            register::PROJECTOR_STATUS => vec![if self.powered { 0x02 } else { 0x00 }],
            _ if !self.powered => return (CommandType::Error, Vec::new()),
            register::LIGHT_SOURCE_USAGE => 1234u32.to_le_bytes().to_vec(),
            register::TEMPERATURE => 412u32.to_le_bytes().to_vec(),
            register::CONTRAST => 50i16.to_le_bytes().to_vec(),
            other => vec![self.bytes.get(&other).copied().unwrap_or_default()],
        };
        let mut payload = vec![0x34, 0x00];
        payload.extend_from_slice(&data);
        (CommandType::ReadResponse, payload)
    }
}

fn encode_response(command: CommandType, payload: &[u8]) -> BytesMut {
    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len() + 1);
    frame.extend_from_slice(&[command.code(), 0x00, 0x00]);
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(payload);
    let sum = checksum([&frame[1..]]);
    frame.extend_from_slice(&[sum]);
    frame
}

async fn serve(mut stream: TcpStream, registers: Arc<Mutex<Registers>>) -> std::io::Result<()> {
    loop {
        let mut head = [0u8; HEADER_SIZE];
        stream.read_exact(&mut head).await?;
        let Ok(header) = decode_header(&head) else {
            return Ok(());
        };
        let mut body = vec![0u8; header.body_len()];
        stream.read_exact(&mut body).await?;

        // requests carry the same checksum rule as responses
        let (command, payload) = match decode_body(&header, &body) {
            Ok(payload) => registers
                .lock()
                .map_err(|_| std::io::Error::other("register map poisoned"))?
                .handle(header.command, &payload),
            Err(err) => {
                eprintln!("bad request: {err}");
                (CommandType::Error, Vec::new())
            }
        };
        stream.write_all(&encode_response(command, &payload)).await?;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:4661".to_string());
    let listener = TcpListener::bind(&addr).await?;
    eprintln!("Mock projector listening on {}", listener.local_addr()?);

    let registers = Arc::new(Mutex::new(Registers::default()));
    loop {
        let (stream, peer) = listener.accept().await?;
        eprintln!("Controller connected: {peer}");
        let registers = Arc::clone(&registers);
        tokio::spawn(async move {
            if let Err(err) = serve(stream, registers).await {
                eprintln!("Controller {peer} disconnected: {err}");
            }
        });
    }
}
