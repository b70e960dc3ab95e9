//! Definition wrappers over the raw spec sub-trees
//!
//! Each wrapper parses its sub-tree once at construction, rejecting malformed
//! shapes with a `SpecParseError`, and afterwards answers two questions for the
//! materialization driver: does this sub-tree define a channel, and if so,
//! write it into the accumulator.
//!
//! # Architecture
//!
//! - `DefinitionKind`: Enum for pattern matching and logging
//! - `DefinitionTrait`: The two-method lookup/materialize contract
//! - `ConfigDefinition`, `EncodingDefinition`, `MarkDefinition`: one struct per sub-tree

use crate::accumulator::{Binding, MarkProperty, OutputAccumulator};
use crate::property::Property;
use crate::spec::RenderContext;
use crate::Result;

mod config;
mod encoding;
mod mark;

pub use config::ConfigDefinition;
pub use encoding::EncodingDefinition;
pub use mark::MarkDefinition;

/// Which spec sub-tree a wrapper covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Config,
    Encoding,
    Mark,
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DefinitionKind::Config => "config",
            DefinitionKind::Encoding => "encoding",
            DefinitionKind::Mark => "mark",
        };
        write!(f, "{}", s)
    }
}

/// Lookup/materialize contract shared by the three wrappers
pub trait DefinitionTrait: std::fmt::Debug {
    fn kind(&self) -> DefinitionKind;

    /// Whether this sub-tree defines the descriptor's channel
    fn has_property(&self, property: &Property) -> bool;

    /// Write the descriptor's binding into the accumulator.
    ///
    /// Returns `Ok(false)` when the channel is not defined here; invalid
    /// definitions are errors, never a silent `false`.
    fn materialize_property(
        &self,
        property: &Property,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<bool>;
}

/// Write a literal binding for a descriptor's channel
fn bind_value(
    property: &Property,
    value: &serde_json::Value,
    acc: &mut OutputAccumulator,
) -> Result<()> {
    acc.mark_properties.insert(
        property.channel(),
        MarkProperty {
            outputs: property.outputs(),
            binding: Binding::Value(value.clone()),
        },
    )
}
