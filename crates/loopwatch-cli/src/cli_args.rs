use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use loopwatch_status::{GlucoseUnits, DEFAULT_URGENT_MINUTES, DEFAULT_WARN_MINUTES, LOOP_DEVICE_PREFIX};

fn parse_positive_minutes(value: &str) -> Result<i64, String> {
    let parsed = value
        .parse::<i64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed <= 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| format!("failed to parse RFC 3339 timestamp: {error}"))
}

fn parse_units(value: &str) -> Result<GlucoseUnits, String> {
    value.parse::<GlucoseUnits>().map_err(|error| error.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "loopwatch",
    about = "Evaluate closed-loop controller status reports and staleness alarms",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a device-status JSON export at one instant.
    Evaluate(EvaluateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    #[arg(
        long,
        env = "LOOPWATCH_STATUSES",
        help = "Path to a device-status JSON array (or an object with a devicestatus array)"
    )]
    pub statuses: PathBuf,

    #[arg(
        long,
        value_parser = parse_rfc3339,
        help = "Evaluation instant in RFC 3339 format; defaults to the current time"
    )]
    pub now: Option<DateTime<Utc>>,

    #[arg(
        long,
        env = "LOOPWATCH_UNITS",
        default_value = "mg/dl",
        value_parser = parse_units,
        help = "Glucose units used for forecast values (mg/dl or mmol)"
    )]
    pub units: GlucoseUnits,

    #[arg(
        long = "enable-alerts",
        env = "LOOPWATCH_ENABLE_ALERTS",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Raise \"Loop isn't looping\" alarms when the loop is stale"
    )]
    pub enable_alerts: bool,

    #[arg(
        long = "warn-minutes",
        env = "LOOPWATCH_WARN_MINUTES",
        default_value_t = DEFAULT_WARN_MINUTES,
        value_parser = parse_positive_minutes,
        help = "Minutes without a loop cycle before a warning alarm"
    )]
    pub warn_minutes: i64,

    #[arg(
        long = "urgent-minutes",
        env = "LOOPWATCH_URGENT_MINUTES",
        default_value_t = DEFAULT_URGENT_MINUTES,
        value_parser = parse_positive_minutes,
        help = "Minutes without a loop cycle before an urgent alarm"
    )]
    pub urgent_minutes: i64,

    #[arg(
        long = "lookback-minutes",
        value_parser = parse_positive_minutes,
        help = "Ignore controller reports uploaded longer ago than this"
    )]
    pub lookback_minutes: Option<i64>,

    #[arg(
        long = "device-prefix",
        default_value = LOOP_DEVICE_PREFIX,
        help = "Device identifier prefix of controller self-reports"
    )]
    pub device_prefix: String,

    #[arg(
        long,
        env = "LOOPWATCH_DEVICE",
        help = "Also summarize the newest report from exactly this device"
    )]
    pub device: Option<String>,

    #[arg(long, help = "Print the evaluation as JSON")]
    pub json: bool,

    #[arg(long, help = "Also write the JSON evaluation to this path")]
    pub output: Option<PathBuf>,
}
