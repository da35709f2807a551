use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use vsctl::device::Projector;
use vsctl::session::{Session, SessionConfig, SessionError};

use crate::exit::{session_error, CliError, CliResult, TIMEOUT, USAGE};
use crate::output::OutputFormat;

pub mod read;
pub mod status;
pub mod switch;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a register.
    Read(ReadArgs),
    /// Write a register.
    Write(WriteArgs),
    /// Send a raw remote-control key write.
    Key(WriteArgs),
    /// Press a named remote-control button.
    Remote(RemoteArgs),
    /// Print power, status, audio and light-source information.
    Status(StatusArgs),
    /// Switch the projector on or off.
    Power(SwitchArgs),
    /// Switch audio mute on or off.
    Mute(SwitchArgs),
    /// Poll status until interrupted.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, format).await,
        Command::Write(args) => write::run_write(args, format).await,
        Command::Key(args) => write::run_key(args, format).await,
        Command::Remote(args) => write::run_remote(args, format).await,
        Command::Status(args) => status::run(args, format).await,
        Command::Power(args) => switch::run_power(args, format).await,
        Command::Mute(args) => switch::run_mute(args, format).await,
        Command::Watch(args) => status::watch(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Projector address: host or host:port (default port 4661).
    #[arg(long, short = 'a', env = "VSCTL_ADDR")]
    pub addr: String,
    /// How long to wait for the first connection (e.g. 5s, 500ms).
    #[arg(long, env = "VSCTL_CONNECT_TIMEOUT", default_value = "5s")]
    pub timeout: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Width {
    #[value(name = "1")]
    One,
    #[value(name = "2")]
    Two,
    #[value(name = "n")]
    Any,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Register address (hex with 0x prefix, or decimal).
    pub address: String,
    /// Response width: one byte, signed two bytes, or the raw payload.
    #[arg(long, short = 'w', value_enum, default_value = "1")]
    pub width: Width,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Register address (hex with 0x prefix, or decimal).
    pub address: String,
    /// Value byte (hex with 0x prefix, or decimal).
    pub value: String,
}

#[derive(Args, Debug)]
pub struct RemoteArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Button name: menu, exit, top, bottom, left, right, source, enter, auto, my-button.
    pub key: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Args, Debug)]
pub struct SwitchArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    #[arg(value_enum)]
    pub state: Switch,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
    /// Delay between polls (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub interval: String,
    /// Exit after N successful polls.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Start a session and wait for the first connection.
pub async fn open(args: &ConnectArgs) -> CliResult<Projector> {
    let timeout = parse_duration(&args.timeout)?;
    let config = SessionConfig::new(args.addr.trim());
    match Session::connect(config, timeout).await {
        Ok(session) => Ok(Projector::new(session)),
        Err(SessionError::NotConnected(addr)) => Err(CliError::new(
            TIMEOUT,
            format!("could not connect to {addr} within {timeout:?}"),
        )),
        Err(err) => Err(session_error("connect failed", err)),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Parse a 16-bit register address.
pub fn parse_register(input: &str) -> CliResult<u16> {
    parse_number(input)
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| CliError::new(USAGE, format!("invalid register address: {input}")))
}

/// Parse a value byte.
pub fn parse_byte(input: &str) -> CliResult<u8> {
    parse_number(input)
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| CliError::new(USAGE, format!("invalid value byte: {input}")))
}

fn parse_number(input: &str) -> Option<u32> {
    let input = input.trim();
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => input.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        for input in ["", "0s", "bad", "5m", "-1s"] {
            let err = parse_duration(input).unwrap_err();
            assert_eq!(err.code, USAGE, "{input:?}");
        }
    }

    #[test]
    fn parse_register_hex_and_decimal() {
        assert_eq!(parse_register("0x1400").unwrap(), 0x1400);
        assert_eq!(parse_register("0X0d0d").unwrap(), 0x0D0D);
        assert_eq!(parse_register("5120").unwrap(), 0x1400);
        assert!(parse_register("0x10000").is_err());
        assert!(parse_register("zz").is_err());
    }

    #[test]
    fn parse_byte_range() {
        assert_eq!(parse_byte("0xFF").unwrap(), 0xFF);
        assert_eq!(parse_byte("1").unwrap(), 1);
        assert_eq!(parse_byte("256").unwrap_err().code, USAGE);
    }
}
