//! Encoding wrapper: per-channel literal or field definitions

use super::{bind_value, DefinitionKind, DefinitionTrait};
use crate::accumulator::{
    Binding, LegendBinding, MarkProperty, OutputAccumulator, QueryTransform, ScaleDef,
};
use crate::naming;
use crate::property::{Property, Registry, ValidationLog};
use crate::spec::{ChannelDef, FieldDef, RenderContext};
use crate::{Result, VislayerError};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default)]
pub struct EncodingDefinition {
    channels: Vec<(String, ChannelDef)>,
}

impl EncodingDefinition {
    /// Parse every entry of the `encoding` block against a registry
    pub fn new(raw: &Map<String, Value>, registry: &Registry) -> Result<Self> {
        let mut channels = Vec::with_capacity(raw.len());
        for (channel, value) in raw {
            match registry.find(channel) {
                None => {
                    return Err(VislayerError::SpecParseError(format!(
                        "Unknown encoding channel '{}' for {} layer. Valid channels are: {}",
                        channel,
                        registry.layer_kind(),
                        registry.valid_channels().join(", ")
                    )))
                }
                Some(p) if !p.location().allows_encoding() => {
                    return Err(VislayerError::SpecParseError(format!(
                        "Channel '{}' can only be set on the mark, not in 'encoding'",
                        channel
                    )))
                }
                Some(_) => {}
            }
            channels.push((channel.clone(), ChannelDef::parse(channel, value)?));
        }
        Ok(Self { channels })
    }

    /// Parsed definition of a channel
    pub fn get(&self, channel: &str) -> Option<&ChannelDef> {
        self.channels
            .iter()
            .find(|(c, _)| c == channel)
            .map(|(_, def)| def)
    }

    fn materialize_field(
        &self,
        property: &Property,
        def: &FieldDef,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<()> {
        let channel = property.channel();
        let measurement = def
            .measurement
            .unwrap_or_else(|| property.default_measurement_type());
        property.validate_measurement_type(measurement)?;

        // Aggregated columns get their own name so they never shadow the raw field
        let column = match def.aggregate {
            Some(op) => naming::aggregate_column(op.name(), &def.field),
            None => def.field.clone(),
        };
        acc.query_transforms.insert(
            channel,
            QueryTransform::Project {
                expr: def.field.clone(),
                alias: def.aggregate.map(|_| column.clone()),
                aggregate: def.aggregate,
            },
        )?;

        let explicit_scale = match &def.scale {
            Some(spec) => {
                if !property.is_scale_eligible() {
                    return Err(VislayerError::PropertyValidationError(format!(
                        "Channel '{}' does not support a 'scale'",
                        channel
                    )));
                }
                let name = naming::scale_name(ctx.layer_name, channel);
                let scale_type = spec
                    .scale_type
                    .clone()
                    .unwrap_or_else(|| measurement.default_scale_type().to_string());
                let domain = spec
                    .domain
                    .clone()
                    .unwrap_or_else(|| json!({"data": ctx.layer_name, "field": column}));
                acc.scales.insert(
                    name.clone(),
                    ScaleDef {
                        name: name.clone(),
                        scale_type,
                        domain,
                        range: spec.range.clone(),
                    },
                )?;
                Some(name)
            }
            None => None,
        };

        if let Some(legend) = &def.legend {
            let Some(scale) = &explicit_scale else {
                return Err(VislayerError::PropertyValidationError(format!(
                    "Legend on channel '{}' requires an explicit 'scale'",
                    channel
                )));
            };
            acc.legends.insert(
                channel,
                LegendBinding {
                    scale: scale.clone(),
                    title: legend.title.clone().unwrap_or_else(|| def.field.clone()),
                },
            )?;
        }

        let scale = explicit_scale.or_else(|| property.build_default_scale_definition(ctx));

        acc.mark_properties.insert(
            channel,
            MarkProperty {
                outputs: property.outputs(),
                binding: Binding::field(column, scale),
            },
        )
    }
}

impl DefinitionTrait for EncodingDefinition {
    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Encoding
    }

    fn has_property(&self, property: &Property) -> bool {
        self.get(property.channel()).is_some()
    }

    fn materialize_property(
        &self,
        property: &Property,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<bool> {
        let Some(def) = self.get(property.channel()) else {
            return Ok(false);
        };
        property.validate_context(ctx)?;

        let mut log = ValidationLog::new();
        if !property.is_valid_value_definition(def, &mut log) {
            let message = log.last().map(str::to_string).unwrap_or_else(|| {
                format!("Invalid definition for channel '{}'", property.channel())
            });
            return Err(VislayerError::PropertyValidationError(message));
        }

        match def {
            ChannelDef::Value(value) => bind_value(property, value, acc)?,
            ChannelDef::Field(field) => self.materialize_field(property, field, ctx, acc)?,
        }
        Ok(true)
    }
}
