use crate::cmd::{open, parse_register, ReadArgs, Width};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{hex, print_register, OutputFormat, RegisterOutput};

pub async fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let address = parse_register(&args.address)?;
    let projector = open(&args.connect).await?;
    let session = projector.session();

    let result = match args.width {
        Width::One => session.read(address).await.map(|value| RegisterOutput {
            address: format!("0x{address:04X}"),
            width: "1",
            value: Some(i64::from(value)),
            payload: None,
        }),
        Width::Two => session.read_2_bytes(address).await.map(|value| RegisterOutput {
            address: format!("0x{address:04X}"),
            width: "2",
            value: Some(i64::from(value)),
            payload: None,
        }),
        Width::Any => session.read_n_bytes(address).await.map(|payload| RegisterOutput {
            address: format!("0x{address:04X}"),
            width: "n",
            value: None,
            payload: Some(hex(&payload)),
        }),
    };
    projector.close().await;

    let out = result.map_err(|err| session_error("read failed", err))?;
    print_register(&out, format);
    Ok(SUCCESS)
}
