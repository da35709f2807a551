use vsctl::device::register::{MUTE, POWER_OFF, POWER_ON};

use crate::cmd::{open, Switch, SwitchArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_ack, AckOutput, OutputFormat};

pub async fn run_power(args: SwitchArgs, format: OutputFormat) -> CliResult<i32> {
    let on = args.state == Switch::On;
    let projector = open(&args.connect).await?;

    let result = projector.set_power(on).await;
    projector.close().await;
    result.map_err(|err| device_error("power failed", err))?;

    let out = AckOutput {
        action: "power",
        address: format!("0x{:04X}", if on { POWER_ON } else { POWER_OFF }),
        value: 0x00,
        acknowledged: true,
    };
    print_ack(&out, format);
    Ok(SUCCESS)
}

pub async fn run_mute(args: SwitchArgs, format: OutputFormat) -> CliResult<i32> {
    let mute = args.state == Switch::On;
    let projector = open(&args.connect).await?;

    let result = projector.set_mute(mute).await;
    projector.close().await;
    result.map_err(|err| device_error("mute failed", err))?;

    let out = AckOutput {
        action: "mute",
        address: format!("0x{MUTE:04X}"),
        value: u8::from(mute),
        acknowledged: true,
    };
    print_ack(&out, format);
    Ok(SUCCESS)
}
