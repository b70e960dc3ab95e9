//! Descriptor for string properties with a fixed set of choices

use super::{invalid_value, PropertyInfo, PropertyKind, PropertyTrait, SearchLocation};
use crate::spec::MeasurementType;
use crate::Result;
use serde_json::Value;

/// Channel accepting one of a fixed set of names (e.g. `lineJoin`)
#[derive(Debug, Clone)]
pub struct EnumeratedProperty {
    info: PropertyInfo,
    choices: &'static [&'static str],
}

impl EnumeratedProperty {
    pub fn new(
        channel: &'static str,
        outputs: &'static [&'static str],
        choices: &'static [&'static str],
    ) -> Self {
        Self {
            info: PropertyInfo::new(channel, outputs),
            choices,
        }
    }

    pub fn with_location(mut self, location: SearchLocation) -> Self {
        self.info.location = location;
        self
    }

    pub fn choices(&self) -> &'static [&'static str] {
        self.choices
    }
}

impl PropertyTrait for EnumeratedProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Enumerated
    }

    fn info(&self) -> &PropertyInfo {
        &self.info
    }

    fn is_valid_mark_definition(&self, value: &Value) -> Result<()> {
        match value.as_str() {
            Some(s) if self.choices.contains(&s) => Ok(()),
            _ => Err(invalid_value(
                self.info.channel,
                value,
                &format!("one of: {}", self.choices.join(", ")),
            )),
        }
    }

    fn allowed_measurement_types(&self) -> &'static [MeasurementType] {
        &[MeasurementType::Nominal]
    }
}
