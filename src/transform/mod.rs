//! Transform pipeline
//!
//! Transforms are parsed eagerly from the raw `transform` array. Each one
//! validates its own parameters at construction, so nothing is written to the
//! accumulator for a spec with a malformed transform. At materialization they
//! seed the accumulator (query steps, data formats, mark properties that win
//! over encoding) and may queue a realignment.
//!
//! # Architecture
//!
//! - `TransformKind`: Enum for pattern matching
//! - `TransformTrait`: Trait implemented by each transform
//! - `Transform`: Wrapper struct holding an `Arc<dyn TransformTrait>`
//!
//! # Example
//!
//! ```rust
//! use vislayer::transform::{Transform, TransformKind};
//! use serde_json::json;
//!
//! let limit = Transform::parse(&json!({"type": "limit", "row": 500})).unwrap();
//! assert_eq!(limit.kind(), TransformKind::Limit);
//! assert!(Transform::parse(&json!({"type": "limit"})).is_err());
//! ```

use crate::accumulator::OutputAccumulator;
use crate::spec::RenderContext;
use crate::{Result, VislayerError};
use serde_json::{Map, Value};
use std::sync::Arc;

mod cross_section;
mod filter;
mod limit;
mod mesh;
mod sample;

pub use cross_section::{CrossSection2dTransform, CrossSectionLine, CrossSectionTerrainTransform};
pub use filter::FilterTransform;
pub use limit::LimitTransform;
pub use mesh::RasterMesh2dTransform;
pub use sample::SampleTransform;

// =============================================================================
// Transform Kind
// =============================================================================

/// Enum of all transform types for pattern matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Sample,
    Limit,
    Filter,
    RasterMesh2d,
    CrossSection2d,
    CrossSectionTerrain,
}

impl TransformKind {
    /// Every transform kind, in documentation order
    pub const ALL: &'static [TransformKind] = &[
        TransformKind::Sample,
        TransformKind::Limit,
        TransformKind::Filter,
        TransformKind::RasterMesh2d,
        TransformKind::CrossSection2d,
        TransformKind::CrossSectionTerrain,
    ];

    /// The `type` tag used in specs
    pub fn name(&self) -> &'static str {
        match self {
            TransformKind::Sample => "sample",
            TransformKind::Limit => "limit",
            TransformKind::Filter => "filter",
            TransformKind::RasterMesh2d => "rasterMesh2d",
            TransformKind::CrossSection2d => "crossSection2d",
            TransformKind::CrossSectionTerrain => "crossSectionTerrain",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Whether the transform declares the layer's data format
    pub fn declares_data_format(&self) -> bool {
        matches!(
            self,
            TransformKind::RasterMesh2d
                | TransformKind::CrossSection2d
                | TransformKind::CrossSectionTerrain
        )
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Transform Trait
// =============================================================================

/// Core trait for transform behavior
pub trait TransformTrait: std::fmt::Debug + Send + Sync {
    /// Returns which transform type this is
    fn kind(&self) -> TransformKind;

    /// Seed the accumulator. Runs before any channel resolves.
    fn materialize(&self, ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()>;
}

// =============================================================================
// Transform Wrapper
// =============================================================================

/// Parsed, validated transform
#[derive(Clone)]
pub struct Transform(Arc<dyn TransformTrait>);

impl Transform {
    pub fn new(inner: impl TransformTrait + 'static) -> Self {
        Self(Arc::new(inner))
    }

    /// Parse one raw transform object, dispatching on its `type` tag
    pub fn parse(raw: &Value) -> Result<Self> {
        let obj = raw.as_object().ok_or_else(|| {
            VislayerError::SpecParseError(format!(
                "Transform must be an object with a 'type' key, got {}",
                raw
            ))
        })?;
        let tag = match obj.get("type") {
            Some(Value::String(s)) => s.as_str(),
            _ => {
                return Err(VislayerError::SpecParseError(format!(
                    "Transform must have a string 'type' key, got {}",
                    raw
                )))
            }
        };
        let kind = TransformKind::parse(tag).ok_or_else(|| {
            let valid: Vec<&str> = TransformKind::ALL.iter().map(|k| k.name()).collect();
            VislayerError::SpecParseError(format!(
                "Unknown transform type '{}'. Valid types are: {}",
                tag,
                valid.join(", ")
            ))
        })?;

        let params = Params::new(kind, obj)?;
        Ok(match kind {
            TransformKind::Sample => SampleTransform::from_params(&params)?.into(),
            TransformKind::Limit => LimitTransform::from_params(&params)?.into(),
            TransformKind::Filter => FilterTransform::from_params(&params)?.into(),
            TransformKind::RasterMesh2d => RasterMesh2dTransform::from_params(&params)?.into(),
            TransformKind::CrossSection2d => {
                CrossSection2dTransform::from_params(&params)?.into()
            }
            TransformKind::CrossSectionTerrain => {
                CrossSectionTerrainTransform::from_params(&params)?.into()
            }
        })
    }

    pub fn kind(&self) -> TransformKind {
        self.0.kind()
    }

    pub fn materialize(&self, ctx: &RenderContext<'_>, acc: &mut OutputAccumulator) -> Result<()> {
        self.0.materialize(ctx, acc)
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Transform::{:?}", self.0)
    }
}

macro_rules! impl_from_transform {
    ($($ty:ty),* $(,)?) => {
        $(impl From<$ty> for Transform {
            fn from(t: $ty) -> Self {
                Self::new(t)
            }
        })*
    };
}

impl_from_transform!(
    SampleTransform,
    LimitTransform,
    FilterTransform,
    RasterMesh2dTransform,
    CrossSection2dTransform,
    CrossSectionTerrainTransform,
);

/// Parse a whole `transform` array, in declared order.
///
/// A layer takes at most one `sample`, one `limit` and one data-format
/// transform; filters may repeat.
pub fn parse_transforms(raw: &[Value]) -> Result<Vec<Transform>> {
    let transforms: Vec<Transform> = raw.iter().map(Transform::parse).collect::<Result<_>>()?;

    let mut sample = false;
    let mut limit = false;
    let mut data_format: Option<TransformKind> = None;
    for kind in transforms.iter().map(Transform::kind) {
        let seen = match kind {
            TransformKind::Sample => std::mem::replace(&mut sample, true),
            TransformKind::Limit => std::mem::replace(&mut limit, true),
            k if k.declares_data_format() => {
                if let Some(first) = data_format {
                    return Err(VislayerError::SpecParseError(format!(
                        "At most one data format may be declared per layer: '{}' conflicts with already declared '{}'",
                        k, first
                    )));
                }
                data_format = Some(k);
                false
            }
            _ => false,
        };
        if seen {
            return Err(VislayerError::SpecParseError(format!(
                "At most one '{}' transform is allowed per layer",
                kind
            )));
        }
    }
    Ok(transforms)
}

// =============================================================================
// Parameter Access
// =============================================================================

/// Typed access to one transform object's parameters.
///
/// Every accessor error names the transform, the parameter and the expected
/// shape.
pub(crate) struct Params<'a> {
    kind: TransformKind,
    obj: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    /// Wrap a transform object, rejecting parameters the transform does not take
    fn new(kind: TransformKind, obj: &'a Map<String, Value>) -> Result<Self> {
        let allowed = allowed_params(kind);
        for key in obj.keys() {
            if key != "type" && !allowed.contains(&key.as_str()) {
                let expected = if allowed.is_empty() {
                    "none".to_string()
                } else {
                    allowed.join(", ")
                };
                return Err(VislayerError::SpecParseError(format!(
                    "Transform '{}' has unknown parameter '{}'. Valid parameters are: {}",
                    kind, key, expected
                )));
            }
        }
        Ok(Self { kind, obj })
    }

    fn error(&self, key: &str, expected: &str) -> VislayerError {
        let found = self
            .obj
            .get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "nothing".to_string());
        VislayerError::SpecParseError(format!(
            "Transform '{}': '{}' must be {}, got {}",
            self.kind, key, expected, found
        ))
    }

    pub fn required_str(&self, key: &str) -> Result<String> {
        self.optional_str(key)?
            .ok_or_else(|| self.error(key, "a non-empty string"))
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<String>> {
        match self.obj.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
            Some(_) => Err(self.error(key, "a non-empty string")),
        }
    }

    pub fn required_u64(&self, key: &str) -> Result<u64> {
        self.optional_u64(key)?
            .ok_or_else(|| self.error(key, "a non-negative integer"))
    }

    pub fn optional_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.obj.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.error(key, "a non-negative integer")),
        }
    }

    /// Exactly two `[x, y]` points
    pub fn required_line(&self, key: &str) -> Result<CrossSectionLine> {
        const EXPECTED: &str = "exactly two 2-D points, e.g. [[0, 0], [1, 1]]";
        let points = match self.obj.get(key) {
            Some(Value::Array(points)) if points.len() == 2 => points,
            _ => return Err(self.error(key, EXPECTED)),
        };
        let mut line = [[0.0; 2]; 2];
        for (slot, point) in line.iter_mut().zip(points) {
            match point.as_array().map(|p| p.as_slice()) {
                Some([a, b]) => match (a.as_f64(), b.as_f64()) {
                    (Some(a), Some(b)) if a.is_finite() && b.is_finite() => *slot = [a, b],
                    _ => return Err(self.error(key, EXPECTED)),
                },
                _ => return Err(self.error(key, EXPECTED)),
            }
        }
        Ok(CrossSectionLine(line))
    }
}

fn allowed_params(kind: TransformKind) -> &'static [&'static str] {
    match kind {
        TransformKind::Sample => &["size", "limit"],
        TransformKind::Limit => &["row", "offset"],
        TransformKind::Filter => &["expr"],
        TransformKind::RasterMesh2d => &[],
        TransformKind::CrossSection2d => &["x", "y", "z", "crossSectionLine", "dimensionName"],
        TransformKind::CrossSectionTerrain => &["x", "y", "z", "crossSectionLine", "numPoints"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dispatch() {
        let transforms = parse_transforms(&[
            json!({"type": "sample", "size": 1000, "limit": 10}),
            json!({"type": "limit", "row": 5, "offset": 2}),
            json!({"type": "filter", "expr": "t2m > 0"}),
            json!({"type": "rasterMesh2d"}),
        ])
        .unwrap();
        let kinds: Vec<TransformKind> = transforms.iter().map(|t| t.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TransformKind::Sample,
                TransformKind::Limit,
                TransformKind::Filter,
                TransformKind::RasterMesh2d
            ]
        );
    }

    #[test]
    fn test_duplicate_transforms_rejected() {
        for raw in [
            vec![
                json!({"type": "sample", "size": 10, "limit": 1}),
                json!({"type": "sample", "size": 20, "limit": 2}),
            ],
            vec![json!({"type": "limit", "row": 1}), json!({"type": "limit", "row": 2})],
            vec![json!({"type": "rasterMesh2d"}), json!({"type": "rasterMesh2d"})],
        ] {
            let err = parse_transforms(&raw).unwrap_err();
            assert!(matches!(err, VislayerError::SpecParseError(_)), "{raw:?}");
            assert!(err.to_string().contains("At most one"));
        }

        let filters = parse_transforms(&[
            json!({"type": "filter", "expr": "a > 0"}),
            json!({"type": "filter", "expr": "b > 0"}),
        ])
        .unwrap();
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn test_unknown_type_is_error() {
        let err = Transform::parse(&json!({"type": "bin", "field": "a"})).unwrap_err();
        assert!(matches!(err, VislayerError::SpecParseError(_)));
        assert!(err.to_string().contains("Valid types are"));

        assert!(Transform::parse(&json!({"row": 5})).is_err());
        assert!(Transform::parse(&json!("limit")).is_err());
    }

    #[test]
    fn test_unknown_parameter_is_error() {
        let err = Transform::parse(&json!({"type": "rasterMesh2d", "x": "lon"})).unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'x'"));
        assert!(err.to_string().contains("none"));
    }

    #[test]
    fn test_error_names_parameter_and_shape() {
        let err = Transform::parse(&json!({"type": "limit", "row": -1})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'limit'"));
        assert!(msg.contains("'row'"));
        assert!(msg.contains("non-negative integer"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn test_required_line() {
        let bad_lines = [
            json!([[0, 0]]),
            json!([[0, 0], [1]]),
            json!([[0, 0], [1, "a"]]),
            json!([[0, 0], [1, 1], [2, 2]]),
            json!("0,0 1,1"),
        ];
        for line in bad_lines {
            let raw = json!({
                "type": "crossSection2d", "x": "lon", "y": "lat", "z": "elev",
                "crossSectionLine": line
            });
            let err = Transform::parse(&raw).unwrap_err();
            assert!(err.to_string().contains("two 2-D points"), "{line}");
        }
    }
}
