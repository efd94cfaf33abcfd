//! Evaluation settings: display units, alert toggles, and staleness thresholds.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{LoopStatusError, LoopStatusResult};

pub const LOOP_DEVICE_PREFIX: &str = "loop://";
pub const DEFAULT_WARN_MINUTES: i64 = 30;
pub const DEFAULT_URGENT_MINUTES: i64 = 60;

const EXTENDED_SETTING_ENABLE_ALERTS: &str = "enableAlerts";
const EXTENDED_SETTING_WARN: &str = "warn";
const EXTENDED_SETTING_URGENT: &str = "urgent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GlucoseUnits {
    #[default]
    #[serde(rename = "mg/dl")]
    MgDl,
    #[serde(rename = "mmol")]
    Mmol,
}

impl GlucoseUnits {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MgDl => "mg/dl",
            Self::Mmol => "mmol",
        }
    }

    /// Decimal places used when a glucose value is shown in these units.
    pub fn display_decimals(self) -> u32 {
        match self {
            Self::MgDl => 0,
            Self::Mmol => 1,
        }
    }
}

impl fmt::Display for GlucoseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlucoseUnits {
    type Err = LoopStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mg/dl" | "mgdl" => Ok(Self::MgDl),
            "mmol" | "mmol/l" => Ok(Self::Mmol),
            _ => Err(LoopStatusError::UnsupportedUnits(raw.to_string())),
        }
    }
}

/// Staleness limits for the "Loop isn't looping" alarm. `urgent >= warn > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopAlertThresholds {
    warn: Duration,
    urgent: Duration,
}

impl LoopAlertThresholds {
    pub fn new(warn: Duration, urgent: Duration) -> LoopStatusResult<Self> {
        if warn <= Duration::zero() {
            return Err(LoopStatusError::NonPositiveThreshold("warn"));
        }
        if urgent <= Duration::zero() {
            return Err(LoopStatusError::NonPositiveThreshold("urgent"));
        }
        if urgent < warn {
            return Err(LoopStatusError::ThresholdOrder {
                warn_minutes: warn.num_minutes(),
                urgent_minutes: urgent.num_minutes(),
            });
        }
        Ok(Self { warn, urgent })
    }

    pub fn from_minutes(warn_minutes: i64, urgent_minutes: i64) -> LoopStatusResult<Self> {
        Self::new(
            minutes_setting("warn", warn_minutes)?,
            minutes_setting("urgent", urgent_minutes)?,
        )
    }

    pub fn warn(&self) -> Duration {
        self.warn
    }

    pub fn urgent(&self) -> Duration {
        self.urgent
    }
}

impl Default for LoopAlertThresholds {
    fn default() -> Self {
        Self {
            warn: Duration::minutes(DEFAULT_WARN_MINUTES),
            urgent: Duration::minutes(DEFAULT_URGENT_MINUTES),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub units: GlucoseUnits,
    pub enable_alerts: bool,
    pub thresholds: LoopAlertThresholds,
    /// Identifier prefix that marks controller self-reports in the stream.
    pub device_prefix: String,
    pub max_lookback: Option<Duration>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            units: GlucoseUnits::default(),
            enable_alerts: false,
            thresholds: LoopAlertThresholds::default(),
            device_prefix: LOOP_DEVICE_PREFIX.to_string(),
            max_lookback: None,
        }
    }
}

impl LoopSettings {
    /// Builds settings from string-valued plugin extended settings
    /// (`enableAlerts`, `warn`, `urgent`). Missing keys keep their defaults.
    pub fn from_extended_settings(
        units: GlucoseUnits,
        extended: &BTreeMap<String, String>,
    ) -> LoopStatusResult<Self> {
        let enable_alerts = match extended.get(EXTENDED_SETTING_ENABLE_ALERTS) {
            Some(raw) => parse_flag(EXTENDED_SETTING_ENABLE_ALERTS, raw)?,
            None => false,
        };
        let warn_minutes = match extended.get(EXTENDED_SETTING_WARN) {
            Some(raw) => parse_minutes(EXTENDED_SETTING_WARN, raw)?,
            None => DEFAULT_WARN_MINUTES,
        };
        let urgent_minutes = match extended.get(EXTENDED_SETTING_URGENT) {
            Some(raw) => parse_minutes(EXTENDED_SETTING_URGENT, raw)?,
            None => DEFAULT_URGENT_MINUTES,
        };

        Ok(Self {
            units,
            enable_alerts,
            thresholds: LoopAlertThresholds::from_minutes(warn_minutes, urgent_minutes)?,
            ..Self::default()
        })
    }
}

/// Converts a minute count to a duration, rejecting values chrono cannot represent.
pub fn minutes_setting(key: &str, minutes: i64) -> LoopStatusResult<Duration> {
    Duration::try_minutes(minutes).ok_or_else(|| LoopStatusError::InvalidSetting {
        key: key.to_string(),
        value: minutes.to_string(),
    })
}

fn parse_flag(key: &str, raw: &str) -> LoopStatusResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" | "" => Ok(false),
        _ => Err(LoopStatusError::InvalidSetting {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_minutes(key: &str, raw: &str) -> LoopStatusResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| LoopStatusError::InvalidSetting {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extended(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn unit_extended_settings_accept_uppercase_true() {
        let settings = LoopSettings::from_extended_settings(
            GlucoseUnits::MgDl,
            &extended(&[("enableAlerts", "TRUE")]),
        )
        .expect("settings");
        assert!(settings.enable_alerts);
        assert_eq!(settings.thresholds, LoopAlertThresholds::default());
        assert_eq!(settings.device_prefix, LOOP_DEVICE_PREFIX);
    }

    #[test]
    fn unit_extended_settings_override_thresholds() {
        let settings = LoopSettings::from_extended_settings(
            GlucoseUnits::Mmol,
            &extended(&[("warn", "15"), ("urgent", "45")]),
        )
        .expect("settings");
        assert!(!settings.enable_alerts);
        assert_eq!(settings.units, GlucoseUnits::Mmol);
        assert_eq!(settings.thresholds.warn(), Duration::minutes(15));
        assert_eq!(settings.thresholds.urgent(), Duration::minutes(45));
    }

    #[test]
    fn regression_extended_settings_reject_non_numeric_threshold() {
        let error = LoopSettings::from_extended_settings(
            GlucoseUnits::MgDl,
            &extended(&[("warn", "soon")]),
        )
        .expect_err("non-numeric warn must fail");
        assert!(matches!(error, LoopStatusError::InvalidSetting { ref key, .. } if key == "warn"));
    }

    #[test]
    fn regression_thresholds_reject_urgent_below_warn() {
        let error = LoopAlertThresholds::from_minutes(60, 30).expect_err("ordering must fail");
        assert!(matches!(
            error,
            LoopStatusError::ThresholdOrder {
                warn_minutes: 60,
                urgent_minutes: 30
            }
        ));
        assert!(matches!(
            LoopAlertThresholds::from_minutes(0, 30),
            Err(LoopStatusError::NonPositiveThreshold("warn"))
        ));
    }

    #[test]
    fn unit_glucose_units_parse_known_spellings() {
        assert_eq!("mg/dl".parse::<GlucoseUnits>().expect("mg/dl"), GlucoseUnits::MgDl);
        assert_eq!("MMOL".parse::<GlucoseUnits>().expect("mmol"), GlucoseUnits::Mmol);
        assert!("stone".parse::<GlucoseUnits>().is_err());
    }
}
