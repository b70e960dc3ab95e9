//! Position descriptor (x/y)

use super::{PropertyInfo, PropertyKind, PropertyTrait, SearchLocation, ValidationLog};
use crate::spec::{Axis, ChannelDef, MeasurementType, RenderContext};
use crate::{Result, VislayerError};
use serde_json::Value;

/// Positional channel bound to one chart axis. Fields only.
#[derive(Debug, Clone)]
pub struct PositionProperty {
    info: PropertyInfo,
    axis: Axis,
}

impl PositionProperty {
    /// Position channel, resolved from encoding only
    pub fn new(channel: &'static str, outputs: &'static [&'static str], axis: Axis) -> Self {
        let mut info = PropertyInfo::new(channel, outputs);
        info.location = SearchLocation::EncodingOnly;
        Self { info, axis }
    }
}

/// Shared by position and geographic descriptors
pub(super) fn literal_refused(channel: &str, value: &Value) -> VislayerError {
    VislayerError::PropertyValidationError(format!(
        "Channel '{}' must be bound to a field; literal value {} is not allowed",
        channel, value
    ))
}

impl PropertyTrait for PositionProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Position
    }

    fn info(&self) -> &PropertyInfo {
        &self.info
    }

    fn is_valid_mark_definition(&self, value: &Value) -> Result<()> {
        Err(literal_refused(self.info.channel, value))
    }

    fn is_valid_value_definition(&self, def: &ChannelDef, log: &mut ValidationLog) -> bool {
        match def {
            ChannelDef::Value(value) => {
                log.record(literal_refused(self.info.channel, value).to_string());
                false
            }
            ChannelDef::Field(_) => true,
        }
    }

    fn allowed_measurement_types(&self) -> &'static [MeasurementType] {
        &[
            MeasurementType::Quantitative,
            MeasurementType::Ordinal,
            MeasurementType::Nominal,
            MeasurementType::Temporal,
        ]
    }

    fn is_scale_eligible(&self) -> bool {
        true
    }

    fn build_default_scale_definition(&self, ctx: &RenderContext<'_>) -> Option<String> {
        Some(ctx.chart.default_scale_name(self.axis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ChartSettings, FieldDef, LayerKind};
    use serde_json::json;

    #[test]
    fn test_position_refuses_literals() {
        let x = PositionProperty::new("x", &["x"], Axis::X);
        let mut log = ValidationLog::new();
        assert!(!x.is_valid_value_definition(&ChannelDef::Value(json!(3)), &mut log));
        let msg = log.last().unwrap();
        assert!(msg.contains("'x'"));
        assert!(msg.contains("field"));

        assert!(x.is_valid_value_definition(&ChannelDef::Field(FieldDef::new("lon")), &mut log));
        assert_eq!(log.messages().len(), 1);
        assert!(x.is_valid_mark_definition(&json!(3)).is_err());
    }

    #[test]
    fn test_position_default_scale_uses_chart_axis() {
        let chart = ChartSettings {
            y_scale: "shared_y".to_string(),
            ..ChartSettings::default()
        };
        let ctx = RenderContext::new("t", LayerKind::CrossSection, "profile", &chart);
        let y = PositionProperty::new("y", &["y"], Axis::Y);
        assert_eq!(y.build_default_scale_definition(&ctx).as_deref(), Some("shared_y"));
        assert_eq!(y.info().location, SearchLocation::EncodingOnly);
    }
}
