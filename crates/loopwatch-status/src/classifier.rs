//! Tagged classification of a selected loop report.

use chrono::{DateTime, Duration, Utc};
use loopwatch_core::clamp_non_negative;
use serde::{Serialize, Serializer};

use crate::model::StatusReport;

pub const SYMBOL_LOOPING: &str = "⌁";
pub const SYMBOL_ERROR: &str = "x";
pub const SYMBOL_MISSING: &str = "⚠";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopCategory {
    Enacted,
    IobOnly,
    Error,
    Missing,
}

impl LoopCategory {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Enacted | Self::IobOnly => SYMBOL_LOOPING,
            Self::Error => SYMBOL_ERROR,
            Self::Missing => SYMBOL_MISSING,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Enacted => "enacted",
            Self::IobOnly => "looping",
            Self::Error => "error",
            Self::Missing => "missing",
        }
    }
}

/// Why a report counts as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum LoopFailure {
    /// Free-form `failureReason` text from the controller, kept verbatim.
    Reported(String),
    /// A temp basal was enacted but not confirmed as received by the pump.
    NotReceived,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum LoopStatusKind {
    Enacted {
        rate: f64,
        duration: f64,
        iob: Option<f64>,
    },
    /// Looping without an active enactment; `iob` may still be absent.
    IobOnly { iob: Option<f64> },
    Error { failure: LoopFailure },
    Missing,
}

impl LoopStatusKind {
    pub fn category(&self) -> LoopCategory {
        match self {
            Self::Enacted { .. } => LoopCategory::Enacted,
            Self::IobOnly { .. } => LoopCategory::IobOnly,
            Self::Error { .. } => LoopCategory::Error,
            Self::Missing => LoopCategory::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedStatus {
    pub kind: LoopStatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<StatusReport>,
    /// Signed `now - loop time`; negative under clock skew, `None` when missing.
    #[serde(rename = "age_at_eval_ms", serialize_with = "serialize_age_ms")]
    pub age_at_eval: Option<Duration>,
}

impl ClassifiedStatus {
    pub fn missing() -> Self {
        Self {
            kind: LoopStatusKind::Missing,
            report: None,
            age_at_eval: None,
        }
    }

    pub fn category(&self) -> LoopCategory {
        self.kind.category()
    }

    /// Age used for display, clamped at zero.
    pub fn display_age(&self) -> Option<Duration> {
        self.age_at_eval.map(clamp_non_negative)
    }

    pub fn loop_time(&self) -> Option<DateTime<Utc>> {
        self.report.as_ref().map(StatusReport::loop_time)
    }
}

fn serialize_age_ms<S: Serializer>(age: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    age.map(|age| age.num_milliseconds()).serialize(serializer)
}

/// Classifies `report` as evaluated at `now`.
///
/// A non-empty `failureReason` always wins. An enacted change that was not
/// received is an error even when the rest of the record looks healthy.
pub fn classify(report: Option<&StatusReport>, now: DateTime<Utc>) -> ClassifiedStatus {
    let Some(report) = report else {
        return ClassifiedStatus::missing();
    };
    let age_at_eval = Some(now - report.loop_time());
    let Some(record) = report.loop_record.as_ref() else {
        return ClassifiedStatus {
            kind: LoopStatusKind::Missing,
            report: Some(report.clone()),
            age_at_eval,
        };
    };

    let iob = record.iob.as_ref().map(|iob| iob.iob);
    let kind = if let Some(reason) = record.failure() {
        LoopStatusKind::Error {
            failure: LoopFailure::Reported(reason.to_string()),
        }
    } else if let Some(enacted) = record.enacted.as_ref() {
        if enacted.is_unconfirmed() {
            LoopStatusKind::Error {
                failure: LoopFailure::NotReceived,
            }
        } else {
            LoopStatusKind::Enacted {
                rate: enacted.rate,
                duration: enacted.duration,
                iob,
            }
        }
    } else {
        LoopStatusKind::IobOnly { iob }
    };

    if matches!(age_at_eval, Some(age) if age < Duration::zero()) {
        tracing::warn!(
            created_at = %report.created_at,
            now = %now,
            "loop report is timestamped after the evaluation instant"
        );
    }

    ClassifiedStatus {
        kind,
        report: Some(report.clone()),
        age_at_eval,
    }
}
