//! Loop plugin: select, classify, render, and alarm in one evaluation cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alarm::{evaluate_loop_alarm, NotificationRegistry};
use crate::classifier::{classify, ClassifiedStatus};
use crate::context::StatusWindow;
use crate::host::{RenderHost, LOOP_PROPERTY_NAME};
use crate::model::StatusReport;
use crate::render::{forecast_points, render, DisplayProperty, ForecastPoint};
use crate::selector::StatusSelector;
use crate::settings::LoopSettings;

/// Value offered to the host under the `loop` property name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopProperty {
    pub display: DisplayProperty,
    pub status: ClassifiedStatus,
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, Default)]
pub struct LoopPlugin {
    settings: LoopSettings,
    selector: StatusSelector,
}

impl LoopPlugin {
    pub fn new(settings: LoopSettings) -> Self {
        let selector = StatusSelector::from_settings(&settings);
        Self { settings, selector }
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Pure evaluation of `reports` at `now`.
    #[tracing::instrument(level = "debug", skip(self, reports), fields(report_count = reports.len()))]
    pub fn analyze(&self, reports: &[StatusReport], now: DateTime<Utc>) -> LoopProperty {
        let window = StatusWindow::new(reports, now);
        let status = classify(self.selector.select(&window), now);
        let pill = render(&status, self.settings.units);
        let forecast = forecast_points(&status);
        tracing::debug!(
            code = %pill.code,
            value = %pill.value,
            forecast_points = forecast.len(),
            "evaluated loop status"
        );
        LoopProperty {
            display: pill,
            status,
            forecast,
        }
    }

    /// Evaluates and offers the result to `host` under the `loop` property.
    pub fn set_properties<H>(
        &self,
        reports: &[StatusReport],
        now: DateTime<Utc>,
        host: &mut H,
    ) -> LoopProperty
    where
        H: RenderHost + ?Sized,
    {
        let property = self.analyze(reports, now);
        host.offer_property(LOOP_PROPERTY_NAME, &property);
        property
    }

    /// Pushes pill text and, when present, the forecast curve to `host`.
    pub fn update_visualisation<H>(&self, property: &LoopProperty, host: &mut H)
    where
        H: RenderHost + ?Sized,
    {
        host.update_pill_text(&property.display);
        if !property.forecast.is_empty() {
            host.add_forecast_points(&property.forecast);
        }
    }

    pub fn check_notifications<R>(&self, property: &LoopProperty, now: DateTime<Utc>, registry: &mut R)
    where
        R: NotificationRegistry + ?Sized,
    {
        evaluate_loop_alarm(
            &property.status,
            now,
            self.settings.enable_alerts,
            &self.settings.thresholds,
            registry,
        );
    }

    /// Runs a full host update cycle: properties, visualisation, notifications.
    pub fn run_cycle<H, R>(
        &self,
        reports: &[StatusReport],
        now: DateTime<Utc>,
        host: &mut H,
        registry: &mut R,
    ) -> LoopProperty
    where
        H: RenderHost + ?Sized,
        R: NotificationRegistry + ?Sized,
    {
        let property = self.set_properties(reports, now, host);
        self.update_visualisation(&property, host);
        self.check_notifications(&property, now, registry);
        property
    }
}
