//! Render-document layer fragment
//!
//! ```json
//! {
//!   "data": {"name": "<layer>", "sql": "...", "format": {...}, "transform": [...]},
//!   "scales": [...],
//!   "mark": {"type": "mesh", "from": {"data": "<layer>"}, "properties": {...}},
//!   "legends": [...]
//! }
//! ```
//!
//! `format` and `transform` are omitted when the layer has none. The chart
//! merges fragments of all its layers into one document.

use super::sql::build_query;
use super::Writer;
use crate::accumulator::{DataFormat, OutputBundle};
use crate::spec::RenderContext;
use crate::{Result, VislayerError};
use serde_json::{json, Map, Value};

/// Writes the render-document fragment of a layer
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderWriter;

impl RenderWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Writer for RenderWriter {
    type Output = Value;

    fn write(&self, ctx: &RenderContext<'_>, bundle: &OutputBundle) -> Result<Value> {
        self.validate(bundle)?;

        let mut data = Map::new();
        data.insert("name".to_string(), json!(ctx.layer_name));
        data.insert(
            "sql".to_string(),
            json!(build_query(ctx.table_name, &bundle.query_transforms)),
        );
        if let Some(format) = bundle.data_formats.first() {
            data.insert("format".to_string(), to_value(format)?);
        }
        if !bundle.render_transforms.is_empty() {
            data.insert("transform".to_string(), json!(bundle.render_transforms));
        }

        let legends: Vec<&Value> = bundle.legend_bindings.values().collect();

        Ok(json!({
            "data": data,
            "scales": to_value(&bundle.scales)?,
            "mark": {
                "type": bundle.mark,
                "from": {"data": ctx.layer_name},
                "properties": bundle.mark_properties,
            },
            "legends": legends,
        }))
    }

    fn validate(&self, bundle: &OutputBundle) -> Result<()> {
        if bundle.data_formats.len() > 1 {
            return Err(VislayerError::WriterError(format!(
                "A layer has at most one data format, got {}",
                bundle.data_formats.len()
            )));
        }
        if let Some(DataFormat::Mesh2d { coords: None }) = bundle.data_formats.first() {
            return Err(VislayerError::WriterError(
                "Mesh data format has no coordinate columns; the bundle was not realigned"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| VislayerError::WriterError(e.to_string()))
}
