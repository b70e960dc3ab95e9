//! Geographic descriptor (longitude/latitude)

use super::position::literal_refused;
use super::{PropertyInfo, PropertyKind, PropertyTrait, SearchLocation, ValidationLog};
use crate::spec::{Axis, ChannelDef, MeasurementType, RenderContext};
use crate::{Result, VislayerError};
use serde_json::Value;

/// Longitude/latitude channel. Fields only, and only on geographic charts.
#[derive(Debug, Clone)]
pub struct GeographicProperty {
    info: PropertyInfo,
    axis: Axis,
}

impl GeographicProperty {
    pub fn new(channel: &'static str, outputs: &'static [&'static str], axis: Axis) -> Self {
        let mut info = PropertyInfo::new(channel, outputs);
        info.location = SearchLocation::EncodingOnly;
        Self { info, axis }
    }
}

impl PropertyTrait for GeographicProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Geographic
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
        &[MeasurementType::Quantitative]
    }

    fn is_scale_eligible(&self) -> bool {
        true
    }

    fn build_default_scale_definition(&self, ctx: &RenderContext<'_>) -> Option<String> {
        Some(ctx.chart.default_scale_name(self.axis))
    }

    fn validate_context(&self, ctx: &RenderContext<'_>) -> Result<()> {
        if ctx.chart.uses_geographic_coordinates() {
            return Ok(());
        }
        Err(VislayerError::ContextValidationError(format!(
            "Channel '{}' of layer '{}' requires a chart in geographic coordinate mode",
            self.info.channel, ctx.layer_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ChartSettings, LayerKind};
    use serde_json::json;

    #[test]
    fn test_geographic_requires_geographic_chart() {
        let lon = GeographicProperty::new("longitude", &["x"], Axis::X);

        let cartesian = ChartSettings::cartesian();
        let ctx = RenderContext::new("t", LayerKind::Mesh2d, "mesh", &cartesian);
        let err = lon.validate_context(&ctx).unwrap_err();
        assert!(matches!(err, VislayerError::ContextValidationError(_)));
        assert!(err.to_string().contains("longitude"));

        let geo = ChartSettings::geographic();
        let ctx = RenderContext::new("t", LayerKind::Mesh2d, "mesh", &geo);
        assert!(lon.validate_context(&ctx).is_ok());
        assert_eq!(lon.build_default_scale_definition(&ctx).as_deref(), Some("x"));
    }

    #[test]
    fn test_geographic_refuses_literals() {
        let lat = GeographicProperty::new("latitude", &["y"], Axis::Y);
        let mut log = ValidationLog::new();
        assert!(!lat.is_valid_value_definition(&ChannelDef::Value(json!(45.0)), &mut log));
        assert!(log.last().unwrap().contains("latitude"));
        assert!(lat
            .validate_measurement_type(MeasurementType::Nominal)
            .is_err());
    }
}
