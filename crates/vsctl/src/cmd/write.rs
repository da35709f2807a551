use vsctl::device::RemoteKey;
use vsctl::device::register::REMOTE_KEY;

use crate::cmd::{open, parse_byte, parse_register, RemoteArgs, WriteArgs};
use crate::exit::{device_error, session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_ack, AckOutput, OutputFormat};

pub async fn run_write(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let address = parse_register(&args.address)?;
    let value = parse_byte(&args.value)?;
    let projector = open(&args.connect).await?;

    let result = projector.session().write(address, value).await;
    projector.close().await;
    result.map_err(|err| session_error("write failed", err))?;

    print_ack(&ack("write", address, value), format);
    Ok(SUCCESS)
}

pub async fn run_key(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let address = parse_register(&args.address)?;
    let value = parse_byte(&args.value)?;
    let projector = open(&args.connect).await?;

    let result = projector.session().write_key(address, value).await;
    projector.close().await;
    result.map_err(|err| session_error("key failed", err))?;

    print_ack(&ack("key", address, value), format);
    Ok(SUCCESS)
}

pub async fn run_remote(args: RemoteArgs, format: OutputFormat) -> CliResult<i32> {
    let key: RemoteKey = args.key.parse().map_err(|err| CliError::new(USAGE, err))?;
    let projector = open(&args.connect).await?;

    let result = projector.send_remote_key(key).await;
    projector.close().await;
    result.map_err(|err| device_error("remote key failed", err))?;

    print_ack(&ack("remote", REMOTE_KEY, key.code()), format);
    Ok(SUCCESS)
}

fn ack(action: &'static str, address: u16, value: u8) -> AckOutput {
    AckOutput {
        action,
        address: format!("0x{address:04X}"),
        value,
        acknowledged: true,
    }
}
