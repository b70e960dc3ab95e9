//! Mark wrapper: literal overrides at the top level of `mark`

use super::{bind_value, DefinitionKind, DefinitionTrait};
use crate::accumulator::OutputAccumulator;
use crate::property::{Property, Registry};
use crate::spec::{MarkKind, MarkSpec, RenderContext};
use crate::{Result, VislayerError};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct MarkDefinition {
    kind: MarkKind,
    properties: Map<String, Value>,
}

impl MarkDefinition {
    /// Resolve the mark kind and check every override names a channel that
    /// may be set on the mark.
    pub fn new(spec: &MarkSpec, registry: &Registry) -> Result<Self> {
        let kind = match spec.kind.as_deref() {
            None => registry.layer_kind().default_mark(),
            Some(name) => MarkKind::parse(name).ok_or_else(|| {
                let valid: Vec<&str> = MarkKind::ALL.iter().map(|m| m.name()).collect();
                VislayerError::SpecParseError(format!(
                    "Unknown mark type '{}'. Valid mark types are: {}",
                    name,
                    valid.join(", ")
                ))
            })?,
        };

        for key in spec.properties.keys() {
            match registry.find(key) {
                None => {
                    return Err(VislayerError::SpecParseError(format!(
                        "Unknown mark property '{}' for {} layer. Valid properties are: {}",
                        key,
                        registry.layer_kind(),
                        registry.valid_channels().join(", ")
                    )))
                }
                Some(p) if !p.location().allows_mark() => {
                    return Err(VislayerError::SpecParseError(format!(
                        "Channel '{}' cannot be set on the mark; bind it in 'encoding' instead",
                        key
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            kind,
            properties: spec.properties.clone(),
        })
    }

    /// Mark kind drawn by the layer
    pub fn mark_kind(&self) -> MarkKind {
        self.kind
    }
}

impl DefinitionTrait for MarkDefinition {
    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Mark
    }

    fn has_property(&self, property: &Property) -> bool {
        self.properties.contains_key(property.channel())
    }

    fn materialize_property(
        &self,
        property: &Property,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<bool> {
        let Some(value) = self.properties.get(property.channel()) else {
            return Ok(false);
        };
        property.validate_context(ctx)?;
        property.is_valid_mark_definition(value)?;
        bind_value(property, value, acc)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::Binding;
    use crate::spec::{ChartSettings, LayerKind};
    use serde_json::json;

    fn mark(raw: Value) -> MarkSpec {
        MarkSpec::from_value(Some(&raw)).unwrap()
    }

    #[test]
    fn test_default_mark_kind() {
        let registry = Registry::for_layer(LayerKind::CrossSection);
        let def = MarkDefinition::new(&MarkSpec::default(), registry).unwrap();
        assert_eq!(def.mark_kind(), MarkKind::Line);
    }

    #[test]
    fn test_unknown_mark_kind() {
        let registry = Registry::for_layer(LayerKind::Mesh2d);
        let err = MarkDefinition::new(&mark(json!("bar")), registry).unwrap_err();
        assert!(matches!(err, VislayerError::SpecParseError(_)));
        assert!(err.to_string().contains("mesh, windbarb, line"));
    }

    #[test]
    fn test_unknown_and_encoding_only_keys() {
        let registry = Registry::for_layer(LayerKind::Windbarb);
        let err = MarkDefinition::new(&mark(json!({"glow": 3})), registry).unwrap_err();
        assert!(err.to_string().contains("glow"));

        let err = MarkDefinition::new(&mark(json!({"x": 3})), registry).unwrap_err();
        assert!(err.to_string().contains("encoding"));
    }

    #[test]
    fn test_materialize_literal() {
        let registry = Registry::for_layer(LayerKind::Windbarb);
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("t", LayerKind::Windbarb, "wind", &chart);
        let def =
            MarkDefinition::new(&mark(json!({"type": "windbarb", "size": 12})), registry).unwrap();
        let mut acc = OutputAccumulator::new();

        let size = registry.get("size").unwrap();
        assert!(def.has_property(size));
        assert!(def.materialize_property(size, &ctx, &mut acc).unwrap());
        assert_eq!(
            acc.mark_properties.get("size").unwrap().binding,
            Binding::Value(json!(12))
        );

        let speed = registry.get("speed").unwrap();
        assert!(!def.has_property(speed));
        assert!(!def.materialize_property(speed, &ctx, &mut acc).unwrap());
    }

    #[test]
    fn test_materialize_rejects_out_of_range() {
        let registry = Registry::for_layer(LayerKind::Mesh2d);
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("t", LayerKind::Mesh2d, "mesh", &chart);
        let def = MarkDefinition::new(&mark(json!({"opacity": 1.5})), registry).unwrap();
        let mut acc = OutputAccumulator::new();

        let err = def
            .materialize_property(registry.get("opacity").unwrap(), &ctx, &mut acc)
            .unwrap_err();
        assert!(matches!(err, VislayerError::PropertyValidationError(_)));
        assert!(acc.mark_properties.is_empty());
    }
}
