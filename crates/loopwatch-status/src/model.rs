//! Device-status records as reported by the closed-loop controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::LoopStatusResult;

/// One device-status upload. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub device: String,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_record: Option<LoopRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pump: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<Value>,
}

impl StatusReport {
    /// Instant the controller produced the loop record, falling back to upload time.
    pub fn loop_time(&self) -> DateTime<Utc> {
        self.loop_record
            .as_ref()
            .and_then(|record| record.timestamp)
            .unwrap_or(self.created_at)
    }

    pub fn has_pump(&self) -> bool {
        self.pump.is_some()
    }

    pub fn has_uploader(&self) -> bool {
        self.uploader.is_some()
    }
}

/// The controller's own `loop` sub-record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enacted: Option<LoopEnacted>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iob: Option<LoopIob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted: Option<LoopPredicted>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_bolus: Option<f64>,
}

impl LoopRecord {
    /// Returns the failure text when it carries anything besides whitespace.
    pub fn failure(&self) -> Option<&str> {
        self.failure_reason
            .as_deref()
            .filter(|reason| !reason.trim().is_empty())
    }
}

/// A temporary basal change applied by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopEnacted {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub rate: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<bool>,
}

impl LoopEnacted {
    /// Only an explicit `received: false` counts as unconfirmed.
    pub fn is_unconfirmed(&self) -> bool {
        self.received == Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopIob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub iob: f64,
}

/// Forecast glucose curve; values are spaced five minutes apart from `start_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopPredicted {
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusDocument {
    List(Vec<Value>),
    Wrapped { devicestatus: Vec<Value> },
}

/// Decodes a JSON array of device-status records, or an object wrapping one
/// under `devicestatus`.
///
/// Only a malformed envelope is an error. Records that fail to decode are
/// skipped with a warning so the remaining reports can still be evaluated.
pub fn parse_status_reports(raw: &str) -> LoopStatusResult<Vec<StatusReport>> {
    let document: StatusDocument = serde_json::from_str(raw)?;
    let records = match document {
        StatusDocument::List(records) => records,
        StatusDocument::Wrapped { devicestatus } => devicestatus,
    };
    Ok(records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<StatusReport>(record) {
            Ok(report) => Some(report),
            Err(error) => {
                tracing::warn!(index, %error, "skipping malformed device status record");
                None
            }
        })
        .collect())
}
