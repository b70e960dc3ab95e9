//! Row predicate

use super::{Params, TransformKind, TransformTrait};
use crate::accumulator::{OutputAccumulator, QueryTransform};
use crate::naming;
use crate::spec::RenderContext;
use crate::Result;

/// SQL boolean expression; every filter of a layer is ANDed
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTransform {
    pub expr: String,
}

impl FilterTransform {
    pub(crate) fn from_params(params: &Params<'_>) -> Result<Self> {
        Ok(Self {
            expr: params.required_str("expr")?,
        })
    }
}

impl TransformTrait for FilterTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::Filter
    }

    fn materialize(&self, _ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()> {
        let index = acc
            .query_transforms
            .values()
            .filter(|t| matches!(t, QueryTransform::Filter { .. }))
            .count();
        acc.query_transforms.insert(
            naming::filter_step(index),
            QueryTransform::Filter {
                expr: self.expr.clone(),
            },
        )
    }
}
