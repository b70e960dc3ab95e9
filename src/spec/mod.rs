//! Layer spec input types
//!
//! A raw layer spec is JSON-shaped:
//!
//! ```json
//! {
//!   "mark": {"type": "windbarb", "strokeWidth": 1},
//!   "encoding": {"x": {"field": "lon"}, "strokeColor": {"value": "red"}},
//!   "transform": [{"type": "limit", "row": 1000}],
//!   "config": {"mark": {"opacity": 0.8}, "windbarb": {"size": 20}}
//! }
//! ```
//!
//! `LayerSpec` splits it into its four sub-trees. The definition wrappers and
//! transform pipeline parse each sub-tree into typed form.

pub mod context;
pub mod types;

pub use context::{Axis, ChartHandle, ChartSettings, LayerKind, MarkKind, RenderContext};
pub use types::{AggregateOp, ChannelDef, FieldDef, LegendSpec, MeasurementType, ScaleSpec};

use crate::{Result, VislayerError};
use serde_json::{Map, Value};

/// Raw mark: a bare type name or an object of literal overrides
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkSpec {
    /// Value of `type` (or the bare string form)
    pub kind: Option<String>,
    /// Every other key of the mark object
    pub properties: Map<String, Value>,
}

impl MarkSpec {
    /// Build from the raw `mark` value. Anything that is neither a string nor
    /// an object is treated as an empty mark.
    pub fn from_value(raw: Option<&Value>) -> Result<Self> {
        match raw {
            Some(Value::String(kind)) => Ok(Self {
                kind: Some(kind.clone()),
                properties: Map::new(),
            }),
            Some(Value::Object(obj)) => {
                let mut properties = obj.clone();
                let kind = match properties.remove("type") {
                    None => None,
                    Some(Value::String(s)) => Some(s),
                    Some(other) => {
                        return Err(VislayerError::SpecParseError(format!(
                            "Mark 'type' must be a string, got {}",
                            other
                        )))
                    }
                };
                Ok(Self { kind, properties })
            }
            _ => Ok(Self::default()),
        }
    }
}

/// One layer spec, split into its parts
///
/// Immutable for the duration of a compilation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerSpec {
    pub mark: MarkSpec,
    pub encoding: Map<String, Value>,
    pub transform: Vec<Value>,
    pub config: Map<String, Value>,
}

impl LayerSpec {
    /// Destructure a raw spec. Missing parts default to empty.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let obj = raw.as_object().ok_or_else(|| {
            VislayerError::SpecParseError(format!("Layer spec must be an object, got {}", raw))
        })?;

        let mark = MarkSpec::from_value(obj.get("mark"))?;

        let encoding = match obj.get("encoding") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(VislayerError::SpecParseError(format!(
                    "'encoding' must be an object, got {}",
                    other
                )))
            }
        };

        let transform = match obj.get("transform") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(VislayerError::SpecParseError(format!(
                    "'transform' must be an array, got {}",
                    other
                )))
            }
        };

        let config = match obj.get("config") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(VislayerError::SpecParseError(format!(
                    "'config' must be an object, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            mark,
            encoding,
            transform,
            config,
        })
    }
}
