use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use loopwatch_core::{current_utc, write_text_atomic};
use loopwatch_status::settings::minutes_setting;
use loopwatch_status::{
    parse_status_reports, Alarm, InMemoryNotifications, LoopAlertThresholds, LoopPlugin,
    LoopProperty, LoopSettings, RecordingRenderHost, StatusReport, StatusWindow,
};
use serde::Serialize;

use crate::cli_args::EvaluateArgs;

/// Shape of one upload, shown alongside the loop status for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub device: String,
    pub created_at: DateTime<Utc>,
    pub has_loop: bool,
    pub has_pump: bool,
    pub has_uploader: bool,
}

impl ReportSummary {
    fn from_report(report: &StatusReport) -> Self {
        Self {
            device: report.device.clone(),
            created_at: report.created_at,
            has_loop: report.loop_record.is_some(),
            has_pump: report.has_pump(),
            has_uploader: report.has_uploader(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateReport {
    pub evaluated_at: DateTime<Utc>,
    pub report_count: usize,
    pub latest_report: Option<ReportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_report: Option<ReportSummary>,
    pub property: LoopProperty,
    pub alarms: Vec<Alarm>,
}

pub fn settings_from_args(args: &EvaluateArgs) -> Result<LoopSettings> {
    let thresholds = LoopAlertThresholds::from_minutes(args.warn_minutes, args.urgent_minutes)
        .context("invalid alarm thresholds")?;
    let max_lookback = args
        .lookback_minutes
        .map(|minutes| minutes_setting("lookback", minutes))
        .transpose()
        .context("invalid lookback window")?;
    Ok(LoopSettings {
        units: args.units,
        enable_alerts: args.enable_alerts,
        thresholds,
        device_prefix: args.device_prefix.clone(),
        max_lookback,
    })
}

pub fn run_evaluate(args: &EvaluateArgs) -> Result<EvaluateReport> {
    let raw = std::fs::read_to_string(&args.statuses)
        .with_context(|| format!("failed to read {}", args.statuses.display()))?;
    let reports = parse_status_reports(&raw).with_context(|| {
        format!(
            "failed to parse device statuses in {}",
            args.statuses.display()
        )
    })?;
    let settings = settings_from_args(args)?;
    let now = args.now.unwrap_or_else(current_utc);

    let window = StatusWindow::new(&reports, now);
    let latest_report = window.latest_at_or_before().map(ReportSummary::from_report);
    let device_report = args
        .device
        .as_deref()
        .and_then(|device| window.latest_for_device(device))
        .map(ReportSummary::from_report);

    let plugin = LoopPlugin::new(settings);
    let mut host = RecordingRenderHost::new();
    let mut registry = InMemoryNotifications::new();
    let property = plugin.run_cycle(&reports, now, &mut host, &mut registry);
    tracing::debug!(
        report_count = reports.len(),
        alarm_count = registry.active_alarms().len(),
        "completed loop evaluation"
    );

    Ok(EvaluateReport {
        evaluated_at: now,
        report_count: reports.len(),
        latest_report,
        device_report,
        property,
        alarms: registry.active_alarms().to_vec(),
    })
}

pub fn render_evaluate_report(report: &EvaluateReport) -> String {
    let display = &report.property.display;
    let mut lines = vec![format!(
        "loop status: code={} label=\"{}\" value=\"{}\" evaluated_at={} reports={}",
        display.code,
        display.label,
        display.value,
        report.evaluated_at.to_rfc3339(),
        report.report_count
    )];

    lines.push(render_report_summary("latest report", report.latest_report.as_ref()));
    if let Some(summary) = report.device_report.as_ref() {
        lines.push(render_report_summary("device report", Some(summary)));
    }

    lines.push("info:".to_string());
    for line in &display.info {
        lines.push(format!("  {}: {}", line.label, line.value));
    }

    let forecast = &report.property.forecast;
    match (forecast.first(), forecast.last()) {
        (Some(first), Some(last)) => lines.push(format!(
            "forecast: points={} first={}@{} last={}@{}",
            forecast.len(),
            first.value,
            first.time.to_rfc3339(),
            last.value,
            last.time.to_rfc3339()
        )),
        _ => lines.push("forecast: none".to_string()),
    }

    lines.push("alarms:".to_string());
    if report.alarms.is_empty() {
        lines.push("  none".to_string());
    } else {
        for alarm in &report.alarms {
            lines.push(format!(
                "  {} {}: {} ({})",
                alarm.level.as_str(),
                alarm.name,
                alarm.title,
                alarm.message
            ));
        }
    }
    lines.join("\n")
}

fn render_report_summary(heading: &str, summary: Option<&ReportSummary>) -> String {
    match summary {
        Some(summary) => format!(
            "{heading}: device={} created_at={} loop={} pump={} uploader={}",
            summary.device,
            summary.created_at.to_rfc3339(),
            summary.has_loop,
            summary.has_pump,
            summary.has_uploader
        ),
        None => format!("{heading}: none"),
    }
}

/// Runs `evaluate` and returns the text to print; `--output` also persists JSON.
pub fn execute_evaluate_command(args: &EvaluateArgs) -> Result<String> {
    let report = run_evaluate(args)?;
    let json = serde_json::to_string_pretty(&report).context("failed to serialize evaluation")?;
    if let Some(path) = args.output.as_deref() {
        write_text_atomic(path, &json)?;
    }
    if args.json {
        return Ok(json);
    }
    Ok(render_evaluate_report(&report))
}
