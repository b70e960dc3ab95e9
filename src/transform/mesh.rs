//! Two-dimensional raster mesh decoding

use super::{Params, TransformKind, TransformTrait};
use crate::accumulator::{DataFormat, OutputAccumulator};
use crate::realign::Realignment;
use crate::spec::RenderContext;
use crate::Result;

/// Decode rows into a mesh whose coordinate columns are the layer's
/// position bindings, known only once channels have resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RasterMesh2dTransform;

impl RasterMesh2dTransform {
    pub(crate) fn from_params(_params: &Params<'_>) -> Result<Self> {
        Ok(Self)
    }
}

impl TransformTrait for RasterMesh2dTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::RasterMesh2d
    }

    fn materialize(&self, _ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()> {
        acc.set_data_format(DataFormat::Mesh2d { coords: None })?;
        acc.push_realignment(Realignment::RasterMesh2d);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::accumulator::{DataFormat, OutputAccumulator};
    use crate::realign::Realignment;
    use crate::spec::{ChartSettings, LayerKind, RenderContext};
    use crate::transform::Transform;
    use serde_json::json;

    #[test]
    fn test_declares_format_and_queues_realignment() {
        let chart = ChartSettings::geographic();
        let ctx = RenderContext::new("t", LayerKind::Mesh2d, "mesh", &chart);
        let mesh = Transform::parse(&json!({"type": "rasterMesh2d"})).unwrap();
        let mut acc = OutputAccumulator::new();
        mesh.materialize(&ctx, &mut acc).unwrap();

        assert_eq!(acc.data_format(), Some(&DataFormat::Mesh2d { coords: None }));
        assert_eq!(
            acc.realignments.iter().collect::<Vec<_>>(),
            vec![&Realignment::RasterMesh2d]
        );
        assert!(acc.query_transforms.is_empty());
    }

    #[test]
    fn test_second_mesh_conflicts() {
        let chart = ChartSettings::geographic();
        let ctx = RenderContext::new("t", LayerKind::Mesh2d, "mesh", &chart);
        let mesh = Transform::parse(&json!({"type": "rasterMesh2d"})).unwrap();
        let mut acc = OutputAccumulator::new();
        mesh.materialize(&ctx, &mut acc).unwrap();
        assert!(mesh.materialize(&ctx, &mut acc).is_err());
    }
}
