//! Typed channel definitions parsed from the raw `encoding` block
//!
//! An encoding entry is either a literal (`{"value": ...}`) or a column
//! reference (`{"field": ..., "type"?, "aggregate"?, "scale"?, "legend"?}`).
//! Shape errors are raised here, once, so materialization only ever sees
//! already-validated definitions.

use crate::{Result, VislayerError};
use serde::Serialize;
use serde_json::{Map, Value};

// =============================================================================
// Measurement Types
// =============================================================================

/// How the values of a field are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    Quantitative,
    Ordinal,
    Nominal,
    Temporal,
}

impl MeasurementType {
    /// Parse a measurement type name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "quantitative" => Some(Self::Quantitative),
            "ordinal" => Some(Self::Ordinal),
            "nominal" => Some(Self::Nominal),
            "temporal" => Some(Self::Temporal),
            _ => None,
        }
    }

    /// Scale type used when a field definition asks for a scale without naming one
    pub fn default_scale_type(&self) -> &'static str {
        match self {
            Self::Quantitative => "linear",
            Self::Ordinal | Self::Nominal => "ordinal",
            Self::Temporal => "time",
        }
    }
}

impl std::fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MeasurementType::Quantitative => "quantitative",
            MeasurementType::Ordinal => "ordinal",
            MeasurementType::Nominal => "nominal",
            MeasurementType::Temporal => "temporal",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Aggregate applied to a field in the generated query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateOp {
    /// Parse an aggregate name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// Name as written in the spec
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// SQL function name
    pub fn sql_function(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

// =============================================================================
// Field Definitions
// =============================================================================

/// Explicit scale request on a field definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleSpec {
    /// Scale type (`linear`, `ordinal`, ...); defaults from the measurement type
    pub scale_type: Option<String>,
    pub domain: Option<Value>,
    pub range: Option<Value>,
}

/// Legend request on a field definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegendSpec {
    pub title: Option<String>,
}

/// Column reference for a channel
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub field: String,
    pub measurement: Option<MeasurementType>,
    pub aggregate: Option<AggregateOp>,
    pub scale: Option<ScaleSpec>,
    pub legend: Option<LegendSpec>,
}

impl FieldDef {
    /// Create a plain field reference
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            measurement: None,
            aggregate: None,
            scale: None,
            legend: None,
        }
    }
}

/// A single parsed encoding entry
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelDef {
    /// Constant value for every mark
    Value(Value),
    /// Column reference
    Field(FieldDef),
}

const FIELD_KEYS: &[&str] = &["field", "type", "aggregate", "scale", "legend"];

impl ChannelDef {
    /// Parse one encoding entry.
    ///
    /// A `value` definition must contain nothing else; a `field` definition may
    /// only carry the keys in `FIELD_KEYS`.
    pub fn parse(channel: &str, raw: &Value) -> Result<Self> {
        let obj = raw.as_object().ok_or_else(|| {
            VislayerError::SpecParseError(format!(
                "Encoding '{}' must be an object with a 'value' or 'field' key, got {}",
                channel, raw
            ))
        })?;

        if let Some(value) = obj.get("value") {
            if obj.len() > 1 {
                let extra: Vec<&str> = obj
                    .keys()
                    .filter(|k| k.as_str() != "value")
                    .map(|k| k.as_str())
                    .collect();
                return Err(VislayerError::SpecParseError(format!(
                    "Encoding '{}' is a literal 'value' definition and cannot also contain: {}",
                    channel,
                    extra.join(", ")
                )));
            }
            return Ok(ChannelDef::Value(value.clone()));
        }

        if !obj.contains_key("field") {
            return Err(VislayerError::SpecParseError(format!(
                "Encoding '{}' must contain either a 'value' or a 'field' key",
                channel
            )));
        }

        for key in obj.keys() {
            if !FIELD_KEYS.contains(&key.as_str()) {
                return Err(VislayerError::SpecParseError(format!(
                    "Encoding '{}' has unknown key '{}'. Valid keys for a field definition are: {}",
                    channel,
                    key,
                    FIELD_KEYS.join(", ")
                )));
            }
        }

        Ok(ChannelDef::Field(parse_field_def(channel, obj)?))
    }

    /// Get the field name if this is a column reference
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ChannelDef::Field(def) => Some(&def.field),
            ChannelDef::Value(_) => None,
        }
    }

    /// Check if this is a literal definition
    pub fn is_value(&self) -> bool {
        matches!(self, ChannelDef::Value(_))
    }
}

fn parse_field_def(channel: &str, obj: &Map<String, Value>) -> Result<FieldDef> {
    let field = match obj.get("field") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        other => {
            return Err(VislayerError::SpecParseError(format!(
                "Encoding '{}': 'field' must be a non-empty string, got {}",
                channel,
                other.unwrap_or(&Value::Null)
            )))
        }
    };

    let measurement = match obj.get("type") {
        None => None,
        Some(Value::String(s)) => Some(MeasurementType::parse(s).ok_or_else(|| {
            VislayerError::SpecParseError(format!(
                "Encoding '{}': unknown measurement type '{}'. Expected one of: quantitative, ordinal, nominal, temporal",
                channel, s
            ))
        })?),
        Some(other) => {
            return Err(VislayerError::SpecParseError(format!(
                "Encoding '{}': 'type' must be a string, got {}",
                channel, other
            )))
        }
    };

    let aggregate = match obj.get("aggregate") {
        None => None,
        Some(Value::String(s)) => Some(AggregateOp::parse(s).ok_or_else(|| {
            VislayerError::SpecParseError(format!(
                "Encoding '{}': unknown aggregate '{}'. Expected one of: count, sum, avg, min, max",
                channel, s
            ))
        })?),
        Some(other) => {
            return Err(VislayerError::SpecParseError(format!(
                "Encoding '{}': 'aggregate' must be a string, got {}",
                channel, other
            )))
        }
    };

    let scale = match obj.get("scale") {
        None => None,
        Some(Value::Object(scale)) => Some(parse_scale_spec(channel, scale)?),
        Some(other) => {
            return Err(VislayerError::SpecParseError(format!(
                "Encoding '{}': 'scale' must be an object, got {}",
                channel, other
            )))
        }
    };

    let legend = match obj.get("legend") {
        None => None,
        Some(Value::Object(legend)) => {
            let title = match legend.get("title") {
                None => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => {
                    return Err(VislayerError::SpecParseError(format!(
                        "Encoding '{}': legend 'title' must be a string, got {}",
                        channel, other
                    )))
                }
            };
            Some(LegendSpec { title })
        }
        Some(other) => {
            return Err(VislayerError::SpecParseError(format!(
                "Encoding '{}': 'legend' must be an object, got {}",
                channel, other
            )))
        }
    };

    Ok(FieldDef {
        field,
        measurement,
        aggregate,
        scale,
        legend,
    })
}

fn parse_scale_spec(channel: &str, obj: &Map<String, Value>) -> Result<ScaleSpec> {
    let mut spec = ScaleSpec::default();
    for (key, value) in obj {
        match key.as_str() {
            "type" => match value {
                Value::String(s) => spec.scale_type = Some(s.clone()),
                other => {
                    return Err(VislayerError::SpecParseError(format!(
                        "Encoding '{}': scale 'type' must be a string, got {}",
                        channel, other
                    )))
                }
            },
            "domain" => spec.domain = Some(value.clone()),
            "range" => spec.range = Some(value.clone()),
            other => {
                return Err(VislayerError::SpecParseError(format!(
                    "Encoding '{}': unknown scale key '{}'. Valid keys are: type, domain, range",
                    channel, other
                )))
            }
        }
    }
    Ok(spec)
}
