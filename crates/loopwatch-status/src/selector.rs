//! Chooses the status report a loop evaluation is based on.

use chrono::{DateTime, Duration, Utc};

use crate::context::{latest_created, StatusWindow};
use crate::model::StatusReport;
use crate::settings::{LoopSettings, LOOP_DEVICE_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSelector {
    device_prefix: String,
    max_lookback: Option<Duration>,
}

impl Default for StatusSelector {
    fn default() -> Self {
        Self {
            device_prefix: LOOP_DEVICE_PREFIX.to_string(),
            max_lookback: None,
        }
    }
}

impl StatusSelector {
    pub fn new(device_prefix: impl Into<String>, max_lookback: Option<Duration>) -> Self {
        Self {
            device_prefix: device_prefix.into(),
            max_lookback,
        }
    }

    pub fn from_settings(settings: &LoopSettings) -> Self {
        Self::new(settings.device_prefix.clone(), settings.max_lookback)
    }

    pub fn is_controller_report(&self, report: &StatusReport) -> bool {
        report.device.starts_with(&self.device_prefix) && report.loop_record.is_some()
    }

    /// Newest controller report carrying a `loop` record, at or before the
    /// window's `now` and within the lookback bound when one is set.
    pub fn select<'a>(&self, window: &StatusWindow<'a>) -> Option<&'a StatusReport> {
        let now = window.now();
        let selected = latest_created(window.visible().filter(|report| {
            self.is_controller_report(report)
                && self
                    .max_lookback
                    .map_or(true, |lookback| now - report.created_at <= lookback)
        }));
        tracing::debug!(
            candidates = window.reports().len(),
            selected_created_at = ?selected.map(|report| report.created_at),
            "selected loop status report"
        );
        selected
    }
}

/// Convenience form of [`StatusSelector::select`] using the default
/// controller device prefix.
pub fn select_latest_relevant(
    reports: &[StatusReport],
    now: DateTime<Utc>,
    max_lookback: Option<Duration>,
) -> Option<&StatusReport> {
    StatusSelector::new(LOOP_DEVICE_PREFIX, max_lookback).select(&StatusWindow::new(reports, now))
}
