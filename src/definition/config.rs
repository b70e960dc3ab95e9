//! Config wrapper: style defaults shared across layers
//!
//! ```json
//! {"mark": {"opacity": 0.8}, "windbarb": {"size": 20}}
//! ```
//!
//! The sub-object of the active mark kind wins over the generic `mark` one.
//! Keys that name no channel of this layer are ignored, since one config is
//! usually shared by layers of different kinds.

use super::{bind_value, DefinitionKind, DefinitionTrait};
use crate::accumulator::OutputAccumulator;
use crate::property::Property;
use crate::spec::{MarkKind, RenderContext};
use crate::{Result, VislayerError};
use serde_json::{Map, Value};

/// Key of the generic style sub-object
const GENERIC_SECTION: &str = "mark";

#[derive(Debug, Clone, Default)]
pub struct ConfigDefinition {
    generic: Map<String, Value>,
    /// Sub-object of the mark kind the layer draws
    specific: Map<String, Value>,
}

impl ConfigDefinition {
    /// Split the `config` block, keeping the sections relevant to `mark`
    pub fn new(raw: &Map<String, Value>, mark: MarkKind) -> Result<Self> {
        let mut config = Self::default();
        for (section, value) in raw {
            let kind = if section == GENERIC_SECTION {
                None
            } else {
                match MarkKind::parse(section) {
                    Some(kind) => Some(kind),
                    None => {
                        let mut valid = vec![GENERIC_SECTION];
                        valid.extend(MarkKind::ALL.iter().map(|m| m.name()));
                        return Err(VislayerError::SpecParseError(format!(
                            "Unknown config section '{}'. Valid sections are: {}",
                            section,
                            valid.join(", ")
                        )));
                    }
                }
            };

            let styles = value.as_object().ok_or_else(|| {
                VislayerError::SpecParseError(format!(
                    "Config section '{}' must be an object, got {}",
                    section, value
                ))
            })?;

            match kind {
                None => config.generic = styles.clone(),
                Some(kind) if kind == mark => config.specific = styles.clone(),
                Some(_) => {}
            }
        }
        Ok(config)
    }

    /// Configured value for a channel, mark-kind section first
    pub fn lookup(&self, channel: &str) -> Option<&Value> {
        self.specific
            .get(channel)
            .or_else(|| self.generic.get(channel))
    }
}

impl DefinitionTrait for ConfigDefinition {
    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Config
    }

    fn has_property(&self, property: &Property) -> bool {
        self.lookup(property.channel()).is_some()
    }

    fn materialize_property(
        &self,
        property: &Property,
        ctx: &RenderContext<'_>,
        acc: &mut OutputAccumulator,
    ) -> Result<bool> {
        let Some(value) = self.lookup(property.channel()) else {
            return Ok(false);
        };
        property.validate_context(ctx)?;
        property.is_valid_mark_definition(value)?;
        bind_value(property, value, acc)?;
        Ok(true)
    }
}
