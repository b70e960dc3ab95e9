//! Vertical cuts along a line: raster cross-section and terrain profile
//!
//! Both transforms project the source coordinate columns themselves and hand
//! the rendering backend a data format that resamples them along the line.

use super::{Params, TransformKind, TransformTrait};
use crate::accumulator::{
    Binding, CoordNames, DataFormat, MarkProperty, OutputAccumulator, QueryTransform,
};
use crate::naming;
use crate::realign::Realignment;
use crate::spec::{Axis, RenderContext};
use crate::{Result, VislayerError};
use serde_json::json;

/// Two `[x, y]` end points of a cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSectionLine(pub [[f64; 2]; 2]);

/// Source columns of a cut
#[derive(Debug, Clone, PartialEq)]
struct SourceColumns {
    x: String,
    y: String,
    z: String,
}

impl SourceColumns {
    fn from_params(params: &Params<'_>) -> Result<Self> {
        Ok(Self {
            x: params.required_str("x")?,
            y: params.required_str("y")?,
            z: params.required_str("z")?,
        })
    }

    /// Project every source column under transform-owned keys
    fn project(&self, kind: TransformKind, acc: &mut OutputAccumulator) -> Result<()> {
        for (role, column) in [("x", &self.x), ("y", &self.y), ("z", &self.z)] {
            acc.query_transforms.insert(
                naming::transform_projection(kind.name(), role),
                QueryTransform::project(column.clone()),
            )?;
        }
        Ok(())
    }

    fn coords(&self) -> CoordNames {
        CoordNames {
            x: self.x.clone(),
            y: self.y.clone(),
            z: Some(self.z.clone()),
        }
    }
}

// =============================================================================
// Raster Cross-Section
// =============================================================================

/// Cut through a raster volume; the cut's distance axis is named
/// `dimension_name` and its value column keeps the `z` column's name.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection2dTransform {
    columns: SourceColumns,
    pub line: CrossSectionLine,
    pub dimension_name: String,
}

impl CrossSection2dTransform {
    pub(crate) fn from_params(params: &Params<'_>) -> Result<Self> {
        Ok(Self {
            columns: SourceColumns::from_params(params)?,
            line: params.required_line("crossSectionLine")?,
            dimension_name: params
                .optional_str("dimensionName")?
                .unwrap_or_else(|| naming::DISTANCE_COLUMN.to_string()),
        })
    }
}

impl TransformTrait for CrossSection2dTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::CrossSection2d
    }

    fn materialize(&self, _ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()> {
        acc.set_data_format(DataFormat::CrossSection2d {
            coords: self.columns.coords(),
            cross_section_line: self.line.0,
            dimension_name: self.dimension_name.clone(),
        })?;
        self.columns.project(self.kind(), acc)?;
        acc.push_realignment(Realignment::CrossSection2d {
            z: self.columns.z.clone(),
            dimension_name: self.dimension_name.clone(),
        });
        Ok(())
    }
}

// =============================================================================
// Terrain Profile
// =============================================================================

/// Terrain elevation sampled at `num_points` points along the line.
///
/// Output columns are fixed, so the transform binds x/y itself and no
/// realignment is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionTerrainTransform {
    columns: SourceColumns,
    pub line: CrossSectionLine,
    pub num_points: u32,
}

impl CrossSectionTerrainTransform {
    pub(crate) fn from_params(params: &Params<'_>) -> Result<Self> {
        let columns = SourceColumns::from_params(params)?;
        let line = params.required_line("crossSectionLine")?;
        let num_points = params.required_u64("numPoints")?;
        let num_points = u32::try_from(num_points)
            .ok()
            .filter(|n| *n >= 2)
            .ok_or_else(|| {
                VislayerError::SpecParseError(format!(
                    "Transform 'crossSectionTerrain': 'numPoints' must be an integer between 2 and {}, got {}",
                    u32::MAX,
                    num_points
                ))
            })?;
        Ok(Self {
            columns,
            line,
            num_points,
        })
    }
}

impl TransformTrait for CrossSectionTerrainTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::CrossSectionTerrain
    }

    fn materialize(&self, ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()> {
        acc.set_data_format(DataFormat::CrossSectionTerrain {
            coords: self.columns.coords(),
            cross_section_line: self.line.0,
            num_points: self.num_points,
        })?;
        self.columns.project(self.kind(), acc)?;

        acc.mark_properties.insert(
            "x",
            MarkProperty {
                outputs: &["x"],
                binding: Binding::field(
                    naming::TERRAIN_DISTANCE_COLUMN,
                    Some(ctx.chart.default_scale_name(Axis::X)),
                ),
            },
        )?;
        acc.mark_properties.insert(
            "y",
            MarkProperty {
                outputs: &["y"],
                binding: Binding::field(
                    naming::TERRAIN_ELEVATION_COLUMN,
                    Some(ctx.chart.default_scale_name(Axis::Y)),
                ),
            },
        )?;

        // Line marks connect points in row order
        acc.render_transforms.insert(
            self.kind().name(),
            json!({"type": "collect", "sort": {"field": naming::TERRAIN_DISTANCE_COLUMN}}),
        )
    }
}
