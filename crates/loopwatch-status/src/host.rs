//! Rendering host capability consumed by the loop plugin.

use crate::plugin::LoopProperty;
use crate::render::{DisplayProperty, ForecastPoint};

pub const LOOP_PROPERTY_NAME: &str = "loop";

pub trait RenderHost {
    fn offer_property(&mut self, name: &str, property: &LoopProperty);
    fn update_pill_text(&mut self, display: &DisplayProperty);
    fn add_forecast_points(&mut self, points: &[ForecastPoint]);
}

/// Host that records every call; used by tests and the CLI.
#[derive(Debug, Default)]
pub struct RecordingRenderHost {
    pub properties: Vec<(String, LoopProperty)>,
    pub pills: Vec<DisplayProperty>,
    pub forecasts: Vec<Vec<ForecastPoint>>,
}

impl RecordingRenderHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self, name: &str) -> Option<&LoopProperty> {
        self.properties
            .iter()
            .rev()
            .find(|(offered, _)| offered == name)
            .map(|(_, property)| property)
    }
}

impl RenderHost for RecordingRenderHost {
    fn offer_property(&mut self, name: &str, property: &LoopProperty) {
        self.properties.push((name.to_string(), property.clone()));
    }

    fn update_pill_text(&mut self, display: &DisplayProperty) {
        self.pills.push(display.clone());
    }

    fn add_forecast_points(&mut self, points: &[ForecastPoint]) {
        self.forecasts.push(points.to_vec());
    }
}
