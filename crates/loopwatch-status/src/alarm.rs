//! Staleness alarms for a controller that has stopped looping.

use chrono::{DateTime, Duration, Utc};
use loopwatch_core::{clamp_non_negative, format_relative_age};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifiedStatus, LoopCategory};
use crate::settings::LoopAlertThresholds;

pub const LOOP_ALARM_NAME: &str = "Loop";
pub const LOOP_ALARM_TITLE: &str = "Loop isn't looping";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmLevel {
    None,
    Info,
    Warn,
    Urgent,
}

impl AlarmLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub name: String,
    pub level: AlarmLevel,
    pub title: String,
    pub message: String,
}

/// Alarm sink owned by the host; deduplication and acknowledgement live here.
///
/// Requests are per evaluation cycle: the evaluator clears its own alarm name
/// before submitting, so a stale or recovered level never lingers.
pub trait NotificationRegistry {
    fn request_notify(&mut self, alarm: Alarm);
    fn clear_requests(&mut self, name: &str);
    fn find_highest_alarm(&self, name: &str) -> Option<&Alarm>;
}

/// In-memory registry used by tests and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryNotifications {
    alarms: Vec<Alarm>,
}

impl InMemoryNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    /// Drops every active alarm for `name`, returning how many were cleared.
    pub fn acknowledge(&mut self, name: &str) -> usize {
        let before = self.alarms.len();
        self.alarms.retain(|alarm| alarm.name != name);
        before - self.alarms.len()
    }
}

impl NotificationRegistry for InMemoryNotifications {
    fn request_notify(&mut self, alarm: Alarm) {
        if let Some(existing) = self.alarms.iter_mut().find(|existing| {
            existing.name == alarm.name
                && existing.level == alarm.level
                && existing.title == alarm.title
        }) {
            existing.message = alarm.message;
            return;
        }
        self.alarms.push(alarm);
    }

    fn clear_requests(&mut self, name: &str) {
        self.alarms.retain(|alarm| alarm.name != name);
    }

    fn find_highest_alarm(&self, name: &str) -> Option<&Alarm> {
        self.alarms
            .iter()
            .filter(|alarm| alarm.name == name)
            .max_by_key(|alarm| alarm.level)
    }
}

/// Severity for a loop last seen `elapsed` ago; `None` elapsed means no report.
pub fn staleness_level(elapsed: Option<Duration>, thresholds: &LoopAlertThresholds) -> AlarmLevel {
    match elapsed {
        None => AlarmLevel::Urgent,
        Some(elapsed) if elapsed > thresholds.urgent() => AlarmLevel::Urgent,
        Some(elapsed) if elapsed > thresholds.warn() => AlarmLevel::Warn,
        Some(_) => AlarmLevel::None,
    }
}

/// Submits a "Loop isn't looping" alarm when the last loop cycle is older
/// than a threshold. A missing report is always urgent. Any loop alarm from a
/// previous cycle is cleared first.
#[tracing::instrument(level = "debug", skip(classified, registry), fields(category = ?classified.category()))]
pub fn evaluate_loop_alarm<R>(
    classified: &ClassifiedStatus,
    now: DateTime<Utc>,
    alerts_enabled: bool,
    thresholds: &LoopAlertThresholds,
    registry: &mut R,
) where
    R: NotificationRegistry + ?Sized,
{
    registry.clear_requests(LOOP_ALARM_NAME);
    if !alerts_enabled {
        return;
    }

    let elapsed = match (classified.category(), classified.loop_time()) {
        (LoopCategory::Missing, _) | (_, None) => None,
        (_, Some(loop_time)) => Some(clamp_non_negative(now - loop_time)),
    };
    let level = staleness_level(elapsed, thresholds);
    if level < AlarmLevel::Warn {
        return;
    }

    let message = match elapsed {
        Some(elapsed) => format!("Last Loop: {}", format_relative_age(elapsed)),
        None => "Last Loop: no status reported".to_string(),
    };
    tracing::debug!(level = level.as_str(), %message, "requesting loop alarm");
    registry.request_notify(Alarm {
        name: LOOP_ALARM_NAME.to_string(),
        level,
        title: LOOP_ALARM_TITLE.to_string(),
        message,
    });
}
