//! Closed-loop controller status evaluation and alerting.
//!
//! Selects the newest controller report for an evaluation instant, classifies
//! it into a tagged status, renders pill text plus a forecast curve, and raises
//! "Loop isn't looping" alarms through a host-provided registry.

use thiserror::Error;

pub mod alarm;
pub mod classifier;
pub mod context;
pub mod host;
pub mod model;
pub mod plugin;
pub mod render;
pub mod selector;
pub mod settings;

pub use alarm::{
    evaluate_loop_alarm, staleness_level, Alarm, AlarmLevel, InMemoryNotifications,
    NotificationRegistry, LOOP_ALARM_NAME, LOOP_ALARM_TITLE,
};
pub use classifier::{classify, ClassifiedStatus, LoopCategory, LoopFailure, LoopStatusKind};
pub use context::StatusWindow;
pub use host::{RecordingRenderHost, RenderHost, LOOP_PROPERTY_NAME};
pub use model::{
    parse_status_reports, LoopEnacted, LoopIob, LoopPredicted, LoopRecord, StatusReport,
};
pub use plugin::{LoopPlugin, LoopProperty};
pub use render::{forecast_points, render, DisplayInfo, DisplayProperty, ForecastPoint};
pub use selector::{select_latest_relevant, StatusSelector};
pub use settings::{
    GlucoseUnits, LoopAlertThresholds, LoopSettings, DEFAULT_URGENT_MINUTES, DEFAULT_WARN_MINUTES,
    LOOP_DEVICE_PREFIX,
};

/// Result type for loop status operations.
pub type LoopStatusResult<T> = Result<T, LoopStatusError>;

/// Errors raised while decoding reports or building settings. Data-quality
/// problems in the reports themselves are classifications, not errors.
#[derive(Debug, Error)]
pub enum LoopStatusError {
    #[error("invalid value for setting '{key}': {value}")]
    InvalidSetting { key: String, value: String },
    #[error("threshold '{0}' must be greater than zero")]
    NonPositiveThreshold(&'static str),
    #[error("urgent threshold ({urgent_minutes}m) is shorter than warn threshold ({warn_minutes}m)")]
    ThresholdOrder {
        warn_minutes: i64,
        urgent_minutes: i64,
    },
    #[error("unsupported glucose units '{0}'")]
    UnsupportedUnits(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
