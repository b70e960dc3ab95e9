//! Render context supplied by the caller
//!
//! The context is read-only for the whole compilation. It tells the compiler
//! which table the layer queries, which descriptor registry applies, and how
//! the owning chart is set up (geographic mode, shared axis scales).

use serde::{Deserialize, Serialize};

/// Chart axis used for shared position scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Read-only view of the chart that owns the layer
pub trait ChartHandle: std::fmt::Debug + Send + Sync {
    /// Whether the chart plots longitude/latitude rather than plain x/y
    fn uses_geographic_coordinates(&self) -> bool;

    /// Name of the chart-level scale shared by every layer on this axis
    fn default_scale_name(&self, axis: Axis) -> String;
}

/// Plain chart description for callers without a chart object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartSettings {
    pub geographic: bool,
    pub x_scale: String,
    pub y_scale: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            geographic: false,
            x_scale: "x".to_string(),
            y_scale: "y".to_string(),
        }
    }
}

impl ChartSettings {
    /// Cartesian chart with the default `x`/`y` scales
    pub fn cartesian() -> Self {
        Self::default()
    }

    /// Geographic chart with the default `x`/`y` scales
    pub fn geographic() -> Self {
        Self {
            geographic: true,
            ..Self::default()
        }
    }
}

impl ChartHandle for ChartSettings {
    fn uses_geographic_coordinates(&self) -> bool {
        self.geographic
    }

    fn default_scale_name(&self, axis: Axis) -> String {
        match axis {
            Axis::X => self.x_scale.clone(),
            Axis::Y => self.y_scale.clone(),
        }
    }
}

/// Layer kinds sharing the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    /// Filled mesh surface
    Mesh2d,
    /// Directional glyphs
    Windbarb,
    /// Elevation-profile line
    CrossSection,
}

impl LayerKind {
    /// Mark drawn when the spec does not name one
    pub fn default_mark(&self) -> MarkKind {
        match self {
            LayerKind::Mesh2d => MarkKind::Mesh,
            LayerKind::Windbarb => MarkKind::Windbarb,
            LayerKind::CrossSection => MarkKind::Line,
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LayerKind::Mesh2d => "mesh2d",
            LayerKind::Windbarb => "windbarb",
            LayerKind::CrossSection => "crossSection",
        };
        write!(f, "{}", s)
    }
}

/// Visual primitive drawn by a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Mesh,
    Windbarb,
    Line,
}

impl MarkKind {
    /// All mark kinds, in config lookup order
    pub const ALL: &'static [MarkKind] = &[MarkKind::Mesh, MarkKind::Windbarb, MarkKind::Line];

    /// Parse a mark type name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mesh" => Some(Self::Mesh),
            "windbarb" => Some(Self::Windbarb),
            "line" => Some(Self::Line),
            _ => None,
        }
    }

    /// Name used in specs and render output
    pub fn name(&self) -> &'static str {
        match self {
            MarkKind::Mesh => "mesh",
            MarkKind::Windbarb => "windbarb",
            MarkKind::Line => "line",
        }
    }
}

impl std::fmt::Display for MarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything the compiler knows about the environment of one layer
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub table_name: &'a str,
    pub layer_kind: LayerKind,
    pub layer_name: &'a str,
    /// Row count after the chart's current filters, when known
    pub last_filtered_row_count: Option<u64>,
    pub chart: &'a dyn ChartHandle,
}

impl<'a> RenderContext<'a> {
    /// Create a context with no filtered row count
    pub fn new(
        table_name: &'a str,
        layer_kind: LayerKind,
        layer_name: &'a str,
        chart: &'a dyn ChartHandle,
    ) -> Self {
        Self {
            table_name,
            layer_kind,
            layer_name,
            last_filtered_row_count: None,
            chart,
        }
    }

    /// Set the row count observed after filtering
    pub fn with_last_filtered_row_count(mut self, count: u64) -> Self {
        self.last_filtered_row_count = Some(count);
        self
    }
}
