use tracing::{info, warn};
use vsctl::device::{DeviceError, Projector};

use crate::cmd::{open, parse_duration, StatusArgs, WatchArgs};
use crate::exit::{device_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_status, OutputFormat};

pub async fn run(args: StatusArgs, format: OutputFormat) -> CliResult<i32> {
    let projector = open(&args.connect).await?;
    let result = projector.report().await;
    projector.close().await;

    let report = result.map_err(|err| device_error("status failed", err))?;
    print_status(&report, format);
    Ok(SUCCESS)
}

/// Poll status every interval. Link failures are logged and polling goes on
/// while the session reconnects in the background.
pub async fn watch(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let projector = open(&args.connect).await?;

    let result = poll_until_done(&projector, interval, args.count, format).await;
    projector.close().await;
    result
}

async fn poll_until_done(
    projector: &Projector,
    interval: std::time::Duration,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<i32> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut printed = 0usize;

    loop {
        match projector.report().await {
            Ok(report) => {
                print_status(&report, format);
                printed = printed.saturating_add(1);
                if count.is_some_and(|count| printed >= count) {
                    return Ok(SUCCESS);
                }
            }
            Err(DeviceError::Session(err)) if err.is_transient() => {
                warn!(address = %projector.session().address(), %err, "poll failed, retrying");
            }
            Err(err) => return Err(device_error("status failed", err)),
        }

        tokio::select! {
            signal = &mut ctrl_c => {
                return match signal {
                    Ok(()) => {
                        info!(polls = printed, "interrupted");
                        Ok(SUCCESS)
                    }
                    Err(err) => Err(CliError::new(
                        FAILURE,
                        format!("signal handler setup failed: {err}"),
                    )),
                };
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
