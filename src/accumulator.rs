//! Output accumulator shared by transforms and descriptor resolution
//!
//! Transforms seed the accumulator first; descriptor resolution fills in the
//! rest; realignment patches it; `flatten()` turns it into an `OutputBundle`.
//! Every keyed collection refuses to overwrite an existing key, so no entry
//! can be silently replaced.

use crate::realign::Realignment;
use crate::spec::{AggregateOp, MarkKind};
use crate::{Result, VislayerError};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;

// =============================================================================
// Keyed Collection
// =============================================================================

/// Insertion-ordered collection keyed by channel or synthetic id
#[derive(Debug, Clone, PartialEq)]
pub struct Keyed<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Keyed<T> {
    /// Insert under a new key. An existing key is an internal error: callers
    /// that can hit duplicates from user input check `contains` first.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        let key = key.into();
        if self.contains(&key) {
            return Err(VislayerError::InternalError(format!(
                "accumulator key '{}' written twice",
                key
            )));
        }
        self.entries.push((key, value));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Query Transforms
// =============================================================================

/// One step of the generated query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QueryTransform {
    /// Select a column, optionally aggregated
    Project {
        expr: String,
        #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aggregate: Option<AggregateOp>,
    },
    /// Row predicate, ANDed with every other filter
    Filter { expr: String },
    /// Probabilistic sampling of `limit` rows out of `size`
    Sample { size: u64, limit: u64 },
    /// Row limit
    Limit {
        row: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        offset: Option<u64>,
    },
}

impl QueryTransform {
    /// Plain column projection
    pub fn project(expr: impl Into<String>) -> Self {
        QueryTransform::Project {
            expr: expr.into(),
            alias: None,
            aggregate: None,
        }
    }

    /// Projected column expression, if this is a projection
    pub fn projected_expr(&self) -> Option<&str> {
        match self {
            QueryTransform::Project { expr, .. } => Some(expr),
            _ => None,
        }
    }
}

// =============================================================================
// Data Formats
// =============================================================================

/// Column names feeding a decoder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordNames {
    pub x: String,
    pub y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<String>,
}

/// How the rendering backend should decode the layer's rows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DataFormat {
    /// Two-dimensional mesh; coordinates are known only after realignment
    #[serde(rename = "mesh2d")]
    Mesh2d { coords: Option<CoordNames> },
    /// Vertical cut through a raster volume along a line
    #[serde(rename = "crosssection2d", rename_all = "camelCase")]
    CrossSection2d {
        coords: CoordNames,
        cross_section_line: [[f64; 2]; 2],
        dimension_name: String,
    },
    /// Terrain elevation sampled along a line
    #[serde(rename = "crosssectionTerrain", rename_all = "camelCase")]
    CrossSectionTerrain {
        coords: CoordNames,
        cross_section_line: [[f64; 2]; 2],
        num_points: u32,
    },
}

impl DataFormat {
    /// Format type name as serialized
    pub fn type_name(&self) -> &'static str {
        match self {
            DataFormat::Mesh2d { .. } => "mesh2d",
            DataFormat::CrossSection2d { .. } => "crosssection2d",
            DataFormat::CrossSectionTerrain { .. } => "crosssectionTerrain",
        }
    }
}

// =============================================================================
// Render Bindings
// =============================================================================

/// What a mark property is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Field { field: String, scale: Option<String> },
    Value(Value),
}

impl Binding {
    pub fn field(field: impl Into<String>, scale: Option<String>) -> Self {
        Binding::Field {
            field: field.into(),
            scale,
        }
    }

    pub fn field_name(&self) -> Option<&str> {
        match self {
            Binding::Field { field, .. } => Some(field),
            Binding::Value(_) => None,
        }
    }

    /// Render-spec form: `{"field", "scale"?}` or `{"value"}`
    pub fn to_json(&self) -> Value {
        match self {
            Binding::Field {
                field,
                scale: Some(scale),
            } => json!({"field": field, "scale": scale}),
            Binding::Field { field, scale: None } => json!({"field": field}),
            Binding::Value(value) => json!({"value": value}),
        }
    }
}

/// A channel's resolved binding and the output keys it writes
#[derive(Debug, Clone, PartialEq)]
pub struct MarkProperty {
    pub outputs: &'static [&'static str],
    pub binding: Binding,
}

/// Scale emitted by a layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleDef {
    pub name: String,
    #[serde(rename = "type")]
    pub scale_type: String,
    pub domain: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
}

/// Legend attached to a channel's scale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBinding {
    pub scale: String,
    pub title: String,
}

// =============================================================================
// Accumulator
// =============================================================================

/// Intermediate output of one compilation
#[derive(Debug, Default)]
pub struct OutputAccumulator {
    pub query_transforms: Keyed<QueryTransform>,
    pub render_transforms: Keyed<Value>,
    pub scales: Keyed<ScaleDef>,
    pub mark_properties: Keyed<MarkProperty>,
    pub legends: Keyed<LegendBinding>,
    pub realignments: VecDeque<Realignment>,
    data_format: Option<DataFormat>,
}

impl OutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the layer's data format. Only one declaration is allowed;
    /// transform parsing rejects specs declaring more.
    pub fn set_data_format(&mut self, format: DataFormat) -> Result<()> {
        if let Some(existing) = &self.data_format {
            return Err(VislayerError::InternalError(format!(
                "Data format '{}' set over already declared '{}'",
                format.type_name(),
                existing.type_name()
            )));
        }
        self.data_format = Some(format);
        Ok(())
    }

    pub fn data_format(&self) -> Option<&DataFormat> {
        self.data_format.as_ref()
    }

    pub fn data_format_mut(&mut self) -> Option<&mut DataFormat> {
        self.data_format.as_mut()
    }

    /// Whether a channel already has a mark property (e.g. written by a transform)
    pub fn has_channel(&self, channel: &str) -> bool {
        self.mark_properties.contains(channel)
    }

    /// Queue a fixup to run after every channel has resolved
    pub fn push_realignment(&mut self, realignment: Realignment) {
        self.realignments.push_back(realignment);
    }

    /// Find two channels writing the same mark-property output key
    pub fn check_collisions(&self) -> Result<()> {
        let mut seen: Vec<(&str, &str)> = Vec::new();
        for (channel, property) in self.mark_properties.iter() {
            for output in property.outputs {
                if let Some((_, first)) = seen.iter().find(|(o, _)| o == output) {
                    return Err(VislayerError::CollisionError {
                        output: output.to_string(),
                        first: first.to_string(),
                        second: channel.to_string(),
                    });
                }
                seen.push((*output, channel));
            }
        }
        Ok(())
    }

    /// Snapshot every collection as ordered lists
    pub fn flatten(&self, mark: MarkKind) -> OutputBundle {
        let mut mark_properties = Map::new();
        for (_, property) in self.mark_properties.iter() {
            for output in property.outputs {
                mark_properties.insert(output.to_string(), property.binding.to_json());
            }
        }

        let mut legend_bindings = Map::new();
        for (channel, legend) in self.legends.iter() {
            legend_bindings.insert(
                channel.to_string(),
                json!({"scale": legend.scale, "title": legend.title}),
            );
        }

        OutputBundle {
            mark,
            query_transforms: self.query_transforms.values().cloned().collect(),
            data_formats: self.data_format.iter().cloned().collect(),
            render_transforms: self.render_transforms.values().cloned().collect(),
            scales: self.scales.values().cloned().collect(),
            mark_properties,
            legend_bindings,
        }
    }
}

/// Final artifacts of one compilation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputBundle {
    /// Mark kind the layer draws
    pub mark: MarkKind,
    pub query_transforms: Vec<QueryTransform>,
    pub data_formats: Vec<DataFormat>,
    pub render_transforms: Vec<Value>,
    pub scales: Vec<ScaleDef>,
    /// Keyed by mark-property output name
    pub mark_properties: Map<String, Value>,
    /// Keyed by channel
    pub legend_bindings: Map<String, Value>,
}
