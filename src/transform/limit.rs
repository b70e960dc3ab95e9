//! Row limit with optional offset

use super::{Params, TransformKind, TransformTrait};
use crate::accumulator::{OutputAccumulator, QueryTransform};
use crate::naming;
use crate::spec::RenderContext;
use crate::{Result, VislayerError};

#[derive(Debug, Clone, PartialEq)]
pub struct LimitTransform {
    pub row: u64,
    pub offset: Option<u64>,
}

impl LimitTransform {
    pub(crate) fn from_params(params: &Params<'_>) -> Result<Self> {
        Ok(Self {
            row: params.required_u64("row")?,
            offset: params.optional_u64("offset")?,
        })
    }
}

impl TransformTrait for LimitTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::Limit
    }

    fn materialize(&self, _ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()> {
        if acc.query_transforms.contains(naming::LIMIT_STEP) {
            return Err(VislayerError::InternalError(
                "'limit' step already materialized".to_string(),
            ));
        }
        acc.query_transforms.insert(
            naming::LIMIT_STEP,
            QueryTransform::Limit {
                row: self.row,
                offset: self.offset,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::accumulator::{OutputAccumulator, QueryTransform};
    use crate::naming;
    use crate::spec::{ChartSettings, LayerKind, RenderContext};
    use crate::transform::Transform;
    use serde_json::json;

    #[test]
    fn test_limit_with_offset() {
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("t", LayerKind::Mesh2d, "mesh", &chart);
        let limit = Transform::parse(&json!({"type": "limit", "row": 20, "offset": 40})).unwrap();
        let mut acc = OutputAccumulator::new();
        limit.materialize(&ctx, &mut acc).unwrap();
        assert_eq!(
            acc.query_transforms.get(naming::LIMIT_STEP),
            Some(&QueryTransform::Limit {
                row: 20,
                offset: Some(40)
            })
        );
    }

    #[test]
    fn test_invalid_offset() {
        let err =
            Transform::parse(&json!({"type": "limit", "row": 20, "offset": "10"})).unwrap_err();
        assert!(err.to_string().contains("'offset'"));
    }
}
