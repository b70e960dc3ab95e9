//! Numeric descriptor with optional bounds

use super::{invalid_value, PropertyInfo, PropertyKind, PropertyTrait};
use crate::spec::MeasurementType;
use crate::Result;
use serde_json::Value;
use std::ops::Bound;

/// Numeric channel (opacity, size, direction, ...)
#[derive(Debug, Clone)]
pub struct NumericProperty {
    info: PropertyInfo,
    min: Bound<f64>,
    max: Bound<f64>,
}

impl NumericProperty {
    /// Unbounded numeric channel searched in encoding and mark
    pub fn new(channel: &'static str, outputs: &'static [&'static str]) -> Self {
        Self {
            info: PropertyInfo::new(channel, outputs),
            min: Bound::Unbounded,
            max: Bound::Unbounded,
        }
    }

    pub fn with_bounds(mut self, min: Bound<f64>, max: Bound<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Values in `[0, 1]`
    pub fn unit_interval(self) -> Self {
        self.with_bounds(Bound::Included(0.0), Bound::Included(1.0))
    }

    /// Values `> 0`
    pub fn positive(self) -> Self {
        self.with_bounds(Bound::Excluded(0.0), Bound::Unbounded)
    }

    /// Values `>= 0`
    pub fn non_negative(self) -> Self {
        self.with_bounds(Bound::Included(0.0), Bound::Unbounded)
    }

    fn in_bounds(&self, n: f64) -> bool {
        let above_min = match self.min {
            Bound::Included(min) => n >= min,
            Bound::Excluded(min) => n > min,
            Bound::Unbounded => true,
        };
        let below_max = match self.max {
            Bound::Included(max) => n <= max,
            Bound::Excluded(max) => n < max,
            Bound::Unbounded => true,
        };
        above_min && below_max
    }

    /// Human-readable interval, e.g. `[0, 1]` or `(0, inf)`
    fn describe_bounds(&self) -> String {
        let lower = match self.min {
            Bound::Included(min) => format!("[{}", min),
            Bound::Excluded(min) => format!("({}", min),
            Bound::Unbounded => "(-inf".to_string(),
        };
        let upper = match self.max {
            Bound::Included(max) => format!("{}]", max),
            Bound::Excluded(max) => format!("{})", max),
            Bound::Unbounded => "inf)".to_string(),
        };
        format!("{}, {}", lower, upper)
    }
}

impl PropertyTrait for NumericProperty {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Numeric
    }

    fn info(&self) -> &PropertyInfo {
        &self.info
    }

    fn is_valid_mark_definition(&self, value: &Value) -> Result<()> {
        match value.as_f64() {
            Some(n) if n.is_finite() && self.in_bounds(n) => Ok(()),
            Some(_) => Err(invalid_value(
                self.info.channel,
                value,
                &format!("a number in {}", self.describe_bounds()),
            )),
            None => Err(invalid_value(self.info.channel, value, "a number")),
        }
    }

    fn allowed_measurement_types(&self) -> &'static [MeasurementType] {
        &[MeasurementType::Quantitative, MeasurementType::Ordinal]
    }

    fn is_scale_eligible(&self) -> bool {
        true
    }
}
