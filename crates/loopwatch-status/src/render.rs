//! Pill text and forecast curve derived from a classified status.

use chrono::{DateTime, Duration, Utc};
use loopwatch_core::{format_fixed, format_relative_age};
use serde::Serialize;

use crate::classifier::{ClassifiedStatus, LoopFailure, LoopStatusKind};
use crate::model::LoopRecord;
use crate::settings::GlucoseUnits;

pub const FORECAST_INTERVAL_MINUTES: i64 = 5;
pub const UNKNOWN_AGE_TEXT: &str = "--";
pub const NOT_RECEIVED_MESSAGE: &str = "Temp basal change was not confirmed as received";
pub const MISSING_MESSAGE: &str = "No loop status reported";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayInfo {
    pub label: String,
    pub value: String,
}

impl DisplayInfo {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayProperty {
    pub symbol: String,
    pub code: String,
    pub label: String,
    pub value: String,
    pub info: Vec<DisplayInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Humanized age of the evaluated report, or `--` when there is none.
pub fn age_text(classified: &ClassifiedStatus) -> String {
    classified
        .display_age()
        .map(format_relative_age)
        .unwrap_or_else(|| UNKNOWN_AGE_TEXT.to_string())
}

pub fn render(classified: &ClassifiedStatus, units: GlucoseUnits) -> DisplayProperty {
    let category = classified.category();
    let symbol = category.symbol();
    let age = age_text(classified);

    let mut info = vec![DisplayInfo::new(age.clone(), status_line(&classified.kind))];
    if let Some(record) = classified
        .report
        .as_ref()
        .and_then(|report| report.loop_record.as_ref())
    {
        info.extend(detail_lines(record, units));
    }

    DisplayProperty {
        symbol: symbol.to_string(),
        code: category.code().to_string(),
        label: format!("Loop {symbol}"),
        value: age,
        info,
    }
}

fn status_line(kind: &LoopStatusKind) -> String {
    match kind {
        LoopStatusKind::Enacted {
            rate,
            duration,
            iob,
        } => {
            let mut line = format!(
                "<b>Temp Basal Started</b> {}U/hour for {}m",
                format_fixed(*rate, 2),
                duration
            );
            if let Some(iob) = iob {
                line.push_str(&format!(", IOB: {}U", format_fixed(*iob, 2)));
            }
            line
        }
        LoopStatusKind::IobOnly { iob: Some(iob) } => format!("IOB: {}U", format_fixed(*iob, 2)),
        LoopStatusKind::IobOnly { iob: None } => "Looping".to_string(),
        LoopStatusKind::Error {
            failure: LoopFailure::Reported(reason),
        } => format!("Error: {reason}"),
        LoopStatusKind::Error {
            failure: LoopFailure::NotReceived,
        } => format!("Error: {NOT_RECEIVED_MESSAGE}"),
        LoopStatusKind::Missing => MISSING_MESSAGE.to_string(),
    }
}

fn detail_lines(record: &LoopRecord, units: GlucoseUnits) -> Vec<DisplayInfo> {
    let mut lines = Vec::new();
    if let Some(predicted) = record.predicted.as_ref() {
        if let (Some(first), Some(last)) = (predicted.values.first(), predicted.values.last()) {
            let decimals = units.display_decimals();
            lines.push(DisplayInfo::new(
                "Predicted",
                format!(
                    "{} to {} {}",
                    format_fixed(*first, decimals),
                    format_fixed(*last, decimals),
                    units
                ),
            ));
        }
    }
    if let Some(bolus) = record.recommended_bolus.filter(|bolus| *bolus > 0.0) {
        lines.push(DisplayInfo::new(
            "Recommended Bolus",
            format!("{}U", format_fixed(bolus, 2)),
        ));
    }
    if let Some(version) = record.version.as_deref() {
        lines.push(DisplayInfo::new("Loop Version", version));
    }
    lines
}

/// Forecast curve of the evaluated report: one point per predicted value,
/// spaced [`FORECAST_INTERVAL_MINUTES`] apart from `startDate`. The curve ends
/// early only if a point time would overflow the calendar range.
pub fn forecast_points(classified: &ClassifiedStatus) -> Vec<ForecastPoint> {
    let Some(predicted) = classified
        .report
        .as_ref()
        .and_then(|report| report.loop_record.as_ref())
        .and_then(|record| record.predicted.as_ref())
    else {
        return Vec::new();
    };

    predicted
        .values
        .iter()
        .enumerate()
        .map_while(|(index, value)| {
            let minutes = FORECAST_INTERVAL_MINUTES.checked_mul(index as i64)?;
            let offset = Duration::try_minutes(minutes)?;
            Some(ForecastPoint {
                time: predicted.start_date.checked_add_signed(offset)?,
                value: *value,
            })
        })
        .collect()
}
