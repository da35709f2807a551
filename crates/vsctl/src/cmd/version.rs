use std::time::Duration;

use vsctl::session::{BackoffConfig, Timeouts, DEFAULT_HEALTH_CHECK_REGISTER};
use vsctl::transport::DEFAULT_PORT;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("vsctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let timeouts = Timeouts::default();
    let backoff = BackoffConfig::default();
    println!("name: vsctl");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("VSCTL_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("default_port: {DEFAULT_PORT}");
    println!(
        "timeouts: connect={} write={} header={} body={} drain={}",
        ms(timeouts.connect),
        ms(timeouts.write),
        ms(timeouts.header),
        ms(timeouts.body),
        ms(timeouts.drain)
    );
    println!(
        "backoff: min={} max={} factor={}",
        ms(backoff.min),
        ms(backoff.max),
        backoff.factor
    );
    println!("health_check_register: 0x{DEFAULT_HEALTH_CHECK_REGISTER:04X}");

    Ok(SUCCESS)
}

fn ms(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}
