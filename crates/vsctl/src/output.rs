use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use vsctl::device::StatusReport;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of a raw register read.
#[derive(Serialize)]
pub struct RegisterOutput {
    pub address: String,
    pub width: &'static str,
    /// Decoded value for fixed-width reads.
    pub value: Option<i64>,
    /// Response payload as hex, for reads that return it undecoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// Result of a command that only expects an acknowledgement.
#[derive(Serialize)]
pub struct AckOutput {
    pub action: &'static str,
    pub address: String,
    pub value: u8,
    pub acknowledged: bool,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    #[serde(flatten)]
    report: &'a StatusReport,
    timestamp: String,
}

pub fn print_register(out: &RegisterOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["ADDRESS", "WIDTH", "VALUE", "PAYLOAD"]);
            table.add_row(vec![
                out.address.clone(),
                out.width.to_string(),
                optional(out.value),
                optional(out.payload.as_deref()),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "register={} width={} value={} payload={}",
                out.address,
                out.width,
                optional(out.value),
                optional(out.payload.as_deref())
            );
        }
        OutputFormat::Raw => match out.value {
            Some(value) => println!("{value}"),
            None => println!("{}", optional(out.payload.as_deref())),
        },
    }
}

pub fn print_ack(out: &AckOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "{} {} = 0x{:02X}: acknowledged",
                out.action, out.address, out.value
            );
        }
        OutputFormat::Raw => println!("ok"),
    }
}

pub fn print_status(report: &StatusReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatusOutput {
            report,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            for (field, value) in status_rows(report) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = status_rows(report)
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
        OutputFormat::Raw => println!("{} {}", report.power, report.status),
    }
}

pub fn hex(data: &[u8]) -> String {
    data.iter().map(|byte| format!("{byte:02X}")).collect()
}

fn status_rows(report: &StatusReport) -> Vec<(&'static str, String)> {
    vec![
        ("address", report.address.clone()),
        ("power", report.power.to_string()),
        ("status", report.status.to_string()),
        ("mute", optional(report.mute.map(|m| if m { "on" } else { "off" }))),
        ("volume", optional(report.volume)),
        ("light_source_mode", optional(report.light_source_mode)),
        ("light_source_hours", optional(report.light_source_hours)),
        (
            "temperature_c",
            optional(report.temperature_c.map(|t| format!("{t:.1}"))),
        ),
    ]
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use vsctl::device::{PowerState, ProjectorStatus};

    use super::*;

    #[test]
    fn hex_is_uppercase_without_separators() {
        assert_eq!(hex(&[0x34, 0x00, 0x0A]), "34000A");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn status_rows_mark_missing_values() {
        let report = StatusReport {
            address: "127.0.0.1:4661".to_string(),
            power: PowerState::Off,
            status: ProjectorStatus::PowerOff,
            mute: None,
            volume: None,
            light_source_mode: None,
            light_source_hours: Some(42),
            temperature_c: Some(31.5),
        };
        let rows = status_rows(&report);
        assert!(rows.contains(&("mute", "-".to_string())));
        assert!(rows.contains(&("light_source_hours", "42".to_string())));
        assert!(rows.contains(&("temperature_c", "31.5".to_string())));
        assert!(rows.contains(&("status", "power-off".to_string())));
    }
}
