//! Output writers for compiled layers
//!
//! The compiler stops at an `OutputBundle`. Writers fold a bundle into the
//! two artifacts the rest of a chart consumes: a SQL statement for the query
//! engine and a layer fragment for the render document.
//!
//! # Architecture
//!
//! All writers implement the `Writer` trait, which provides:
//! - Bundle → Output conversion
//! - Validation for writer compatibility
//!
//! # Example
//!
//! ```rust
//! use vislayer::spec::{ChartSettings, LayerKind, RenderContext};
//! use vislayer::writer::{SqlWriter, Writer};
//! use serde_json::json;
//!
//! let chart = ChartSettings::cartesian();
//! let ctx = RenderContext::new("stations", LayerKind::Windbarb, "wind", &chart);
//! let spec = json!({
//!     "encoding": {"x": {"field": "lon"}, "y": {"field": "lat"}},
//!     "transform": [{"type": "limit", "row": 100}]
//! });
//! let bundle = vislayer::compile(&spec, &ctx).unwrap();
//! let sql = SqlWriter::new().write(&ctx, &bundle).unwrap();
//! assert_eq!(sql, r#"SELECT "lon", "lat" FROM stations LIMIT 100"#);
//! ```

use crate::accumulator::OutputBundle;
use crate::spec::RenderContext;
use crate::Result;

pub mod render;
pub mod sql;

pub use render::RenderWriter;
pub use sql::SqlWriter;

/// Trait for bundle writers
///
/// # Associated Types
///
/// * `Output` - The type returned by `write()`: a SQL string, a JSON value, ...
pub trait Writer {
    /// The output type produced by this writer.
    type Output;

    /// Generate output from one compiled layer
    ///
    /// # Errors
    ///
    /// Returns `VislayerError::WriterError` if the bundle is incompatible
    /// with this writer.
    fn write(&self, ctx: &RenderContext<'_>, bundle: &OutputBundle) -> Result<Self::Output>;

    /// Validate that a bundle is compatible with this writer without
    /// generating output.
    fn validate(&self, bundle: &OutputBundle) -> Result<()>;
}

/// SQL statement for a compiled layer
pub fn to_sql(ctx: &RenderContext<'_>, bundle: &OutputBundle) -> Result<String> {
    SqlWriter::new().write(ctx, bundle)
}

/// Render-document fragment for a compiled layer
pub fn to_render_layer(ctx: &RenderContext<'_>, bundle: &OutputBundle) -> Result<serde_json::Value> {
    RenderWriter::new().write(ctx, bundle)
}
