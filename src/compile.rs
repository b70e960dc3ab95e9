//! Materialization driver
//!
//! One compilation: parse the spec into definition wrappers and transforms,
//! let the transforms seed a fresh accumulator, resolve every registered
//! descriptor, check for output collisions, run the realignment queue and
//! flatten the result.
//!
//! Descriptor resolution order:
//!
//! 1. A channel already written by a transform is left alone.
//! 2. `encoding`, then `mark`, as the descriptor's search location permits.
//! 3. The same two lookups on the fallback descriptor, recursively.
//! 4. `config`, once every descriptor has been through steps 1-3.
//!
//! A channel found nowhere is simply absent from the output.

use crate::accumulator::{OutputAccumulator, OutputBundle};
use crate::definition::{
    ConfigDefinition, DefinitionKind, DefinitionTrait, EncodingDefinition, MarkDefinition,
};
use crate::property::{Property, Registry};
use crate::realign;
use crate::spec::{LayerSpec, MarkKind, RenderContext};
use crate::transform::{parse_transforms, Transform};
use crate::Result;
use serde_json::Value;

/// How a descriptor ended up bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// A transform bound the channel before resolution started
    TransformWin,
    EncodingHit,
    MarkHit,
    /// Bound through the fallback chain, from encoding
    FallbackEncodingHit,
    /// Bound through the fallback chain, from the mark
    FallbackMarkHit,
    ConfigHit,
    Unresolved,
}

impl Resolution {
    /// Whether the descriptor produced a mark property
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// Compile a raw layer spec against the registry of the context's layer kind
pub fn compile(spec: &Value, ctx: &RenderContext<'_>) -> Result<OutputBundle> {
    let spec = LayerSpec::from_value(spec)?;
    compile_layer(&spec, Registry::for_layer(ctx.layer_kind), ctx)
}

/// Compile an already-split layer spec against an explicit registry
#[tracing::instrument(
    level = "debug",
    name = "compile",
    skip_all,
    fields(layer = ctx.layer_name, kind = %ctx.layer_kind, table = ctx.table_name)
)]
pub fn compile_layer(
    spec: &LayerSpec,
    registry: &Registry,
    ctx: &RenderContext<'_>,
) -> Result<OutputBundle> {
    let resolver = Resolver::new(spec, registry)?;
    let transforms = parse_transforms(&spec.transform)?;

    let mut acc = OutputAccumulator::new();
    for transform in &transforms {
        tracing::trace!(transform = %transform.kind(), "materializing transform");
        transform.materialize(ctx, &mut acc)?;
    }

    resolver.resolve_all(registry, ctx, &mut acc)?;
    acc.check_collisions()?;
    realign::drain(registry, &mut acc)?;

    Ok(acc.flatten(resolver.mark_kind()))
}

/// The three definition wrappers of one spec
#[derive(Debug)]
pub struct Resolver {
    encoding: EncodingDefinition,
    mark: MarkDefinition,
    config: ConfigDefinition,
}

impl Resolver {
    /// Parse the declarative parts of a spec
    pub fn new(spec: &LayerSpec, registry: &Registry) -> Result<Self> {
        let mark = MarkDefinition::new(&spec.mark, registry)?;
        let encoding = EncodingDefinition::new(&spec.encoding, registry)?;
        let config = ConfigDefinition::new(&spec.config, mark.mark_kind())?;
        Ok(Self {
            encoding,
            mark,
            config,
        })
    }

    pub fn mark_kind(&self) -> MarkKind {
        self.mark.mark_kind()
    }

    /// Resolve every registered descriptor in registry order
    pub fn resolve_all(
        &self,
        registry: &Registry,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<Vec<(&'static str, Resolution)>> {
        let mut outcomes = Vec::with_capacity(registry.len());
        for property in registry.iter() {
            let state = if acc.has_channel(property.channel()) {
                Resolution::TransformWin
            } else {
                self.resolve(property, ctx, acc)?
            };
            outcomes.push((property.channel(), state));
        }

        // Config defaults only fill outputs nothing else has bound
        for (i, property) in registry.iter().enumerate() {
            if outcomes[i].1.is_resolved() || output_bound(property, acc) {
                continue;
            }
            if self.resolve_config(property, ctx, acc)? {
                outcomes[i].1 = Resolution::ConfigHit;
            }
        }

        for (channel, state) in &outcomes {
            tracing::trace!(channel, state = ?state, "resolved channel");
        }
        Ok(outcomes)
    }

    /// Encoding and mark lookups on a descriptor and then its fallback chain
    pub fn resolve(
        &self,
        property: &Property,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<Resolution> {
        for (depth, candidate) in property.chain().enumerate() {
            let found = self.resolve_declared(candidate, ctx, acc)?;
            let state = match (found, depth) {
                (None, _) => continue,
                (Some(DefinitionKind::Encoding), 0) => Resolution::EncodingHit,
                (Some(DefinitionKind::Encoding), _) => Resolution::FallbackEncodingHit,
                (Some(_), 0) => Resolution::MarkHit,
                (Some(_), _) => Resolution::FallbackMarkHit,
            };
            return Ok(state);
        }
        Ok(Resolution::Unresolved)
    }

    /// Encoding then mark, as the descriptor's location permits
    fn resolve_declared(
        &self,
        property: &Property,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<Option<DefinitionKind>> {
        let location = property.location();
        if location.allows_encoding() && self.encoding.materialize_property(property, ctx, acc)? {
            return Ok(Some(self.encoding.kind()));
        }
        if location.allows_mark() && self.mark.materialize_property(property, ctx, acc)? {
            return Ok(Some(self.mark.kind()));
        }
        Ok(None)
    }

    /// Config lookup along the chain; only for descriptors settable on the mark
    fn resolve_config(
        &self,
        property: &Property,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<bool> {
        for candidate in property.chain() {
            if candidate.location().allows_mark()
                && self.config.materialize_property(candidate, ctx, acc)?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn output_bound(property: &Property, acc: &OutputAccumulator) -> bool {
    acc.mark_properties
        .values()
        .any(|bound| bound.outputs.iter().any(|o| property.outputs().contains(o)))
}

/// Transforms of a spec, parsed and validated without compiling
pub fn transforms_of(spec: &LayerSpec) -> Result<Vec<Transform>> {
    parse_transforms(&spec.transform)
}
