//! Color descriptor

use super::{invalid_value, Property, PropertyInfo, PropertyKind, PropertyTrait};
use crate::spec::MeasurementType;
use crate::Result;
use serde_json::Value;

/// Color channel; literals are CSS color strings
#[derive(Debug, Clone)]
pub struct ColorProperty {
    info: PropertyInfo,
}

impl ColorProperty {
    pub fn new(channel: &'static str, outputs: &'static [&'static str]) -> Self {
        Self {
            info: PropertyInfo::new(channel, outputs),
        }
    }

    pub fn with_fallback(mut self, fallback: Property) -> Self {
        self.info.fallback = Some(fallback);
        self
    }
}

impl PropertyTrait for ColorProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Color
    }

    fn info(&self) -> &PropertyInfo {
        &self.info
    }

    fn is_valid_mark_definition(&self, value: &Value) -> Result<()> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Ok(()),
            _ => Err(invalid_value(self.info.channel, value, "a color string")),
        }
    }

    fn allowed_measurement_types(&self) -> &'static [MeasurementType] {
        &[
            MeasurementType::Nominal,
            MeasurementType::Ordinal,
            MeasurementType::Quantitative,
        ]
    }

    fn is_scale_eligible(&self) -> bool {
        true
    }
}
