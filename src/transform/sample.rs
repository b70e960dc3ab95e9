//! Probabilistic row sampling

use super::{Params, TransformKind, TransformTrait};
use crate::accumulator::{OutputAccumulator, QueryTransform};
use crate::naming;
use crate::spec::RenderContext;
use crate::{Result, VislayerError};

/// Keep roughly `limit` rows out of a table of `size` rows
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTransform {
    /// Static table-size hint, used when the context has no filtered count
    pub size: u64,
    pub limit: u64,
}

impl SampleTransform {
    pub(crate) fn from_params(params: &Params<'_>) -> Result<Self> {
        let size = params.required_u64("size")?;
        if size == 0 {
            return Err(VislayerError::SpecParseError(
                "Transform 'sample': 'size' must be a positive integer, got 0".to_string(),
            ));
        }
        Ok(Self {
            size,
            limit: params.required_u64("limit")?,
        })
    }
}

impl TransformTrait for SampleTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::Sample
    }

    fn materialize(&self, ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()> {
        if acc.query_transforms.contains(naming::SAMPLE_STEP) {
            return Err(VislayerError::InternalError(
                "'sample' step already materialized".to_string(),
            ));
        }
        let size = ctx.last_filtered_row_count.unwrap_or(self.size);
        acc.query_transforms.insert(
            naming::SAMPLE_STEP,
            QueryTransform::Sample {
                size,
                limit: self.limit,
            },
        )
    }
}
