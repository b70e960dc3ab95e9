//! Property descriptor trait and implementations
//!
//! A property descriptor describes one channel a layer can bind: which
//! mark-property outputs it writes, where in the spec it may be looked up,
//! which values and measurement types it accepts, and which descriptor to try
//! when the channel itself is not bound anywhere.
//!
//! # Architecture
//!
//! - `PropertyKind`: Enum for pattern matching
//! - `PropertyTrait`: Trait defining descriptor behavior with default implementations
//! - `Property`: Wrapper struct holding an `Arc<dyn PropertyTrait>`
//! - `registry`: The fixed, per-layer-kind descriptor tables
//!
//! Descriptors are built once and never mutated, so a registry can be shared
//! by any number of concurrent compilations.
//!
//! # Example
//!
//! ```rust
//! use vislayer::property::{NumericProperty, Property, PropertyKind};
//! use serde_json::json;
//!
//! let opacity = Property::from(NumericProperty::new("opacity", &["opacity"]).unit_interval());
//! assert_eq!(opacity.kind(), PropertyKind::Numeric);
//! assert!(opacity.is_valid_mark_definition(&json!(0.5)).is_ok());
//! assert!(opacity.is_valid_mark_definition(&json!(1.5)).is_err());
//! ```

use crate::spec::{ChannelDef, MeasurementType, RenderContext};
use crate::{Result, VislayerError};
use serde_json::Value;
use std::sync::Arc;

mod color;
mod enumerated;
mod geographic;
mod numeric;
mod position;
pub mod registry;

pub use color::ColorProperty;
pub use enumerated::EnumeratedProperty;
pub use geographic::GeographicProperty;
pub use numeric::NumericProperty;
pub use position::PositionProperty;
pub use registry::Registry;

// =============================================================================
// Shared Descriptor Data
// =============================================================================

/// Where a descriptor may be resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchLocation {
    /// Only from the `encoding` block
    EncodingOnly,
    /// Only from the top level of `mark`
    MarkOnly,
    /// Encoding first, then mark
    Both,
}

impl SearchLocation {
    pub fn allows_encoding(&self) -> bool {
        matches!(self, SearchLocation::EncodingOnly | SearchLocation::Both)
    }

    pub fn allows_mark(&self) -> bool {
        matches!(self, SearchLocation::MarkOnly | SearchLocation::Both)
    }
}

/// Identity shared by every descriptor variant
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    /// Channel name as written in the spec
    pub channel: &'static str,
    /// Mark-property keys this channel writes
    pub outputs: &'static [&'static str],
    pub location: SearchLocation,
    /// Consulted only after this descriptor fails at every permitted location
    pub fallback: Option<Property>,
}

impl PropertyInfo {
    pub fn new(channel: &'static str, outputs: &'static [&'static str]) -> Self {
        Self {
            channel,
            outputs,
            location: SearchLocation::Both,
            fallback: None,
        }
    }
}

/// Collects messages from non-throwing validators
///
/// `is_valid_value_definition` reports failures here instead of returning an
/// error; the caller decides whether the failure is fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationLog {
    messages: Vec<String>,
}

impl ValidationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Most recent message
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(|s| s.as_str())
    }
}

// =============================================================================
// Property Trait
// =============================================================================

/// Enum of all descriptor variants for pattern matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Numeric,
    Color,
    Position,
    Geographic,
    Enumerated,
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PropertyKind::Numeric => "numeric",
            PropertyKind::Color => "color",
            PropertyKind::Position => "position",
            PropertyKind::Geographic => "geographic",
            PropertyKind::Enumerated => "enumerated",
        };
        write!(f, "{}", s)
    }
}

/// Core trait for descriptor behavior
///
/// Only `kind()`, `info()`, `is_valid_mark_definition()` and
/// `allowed_measurement_types()` are required.
pub trait PropertyTrait: std::fmt::Debug + Send + Sync {
    /// Returns which descriptor variant this is
    fn kind(&self) -> PropertyKind;

    /// Identity data
    fn info(&self) -> &PropertyInfo;

    /// Check a literal value (from mark, config, or an encoding `value`).
    fn is_valid_mark_definition(&self, value: &Value) -> Result<()>;

    /// Measurement types a field bound to this channel may use
    fn allowed_measurement_types(&self) -> &'static [MeasurementType];

    /// Whether field bindings of this channel may carry a scale
    fn is_scale_eligible(&self) -> bool {
        false
    }

    /// Check an encoding definition without failing.
    ///
    /// Literal definitions are checked with `is_valid_mark_definition`; the
    /// error message is recorded in `log` and `false` returned.
    fn is_valid_value_definition(&self, def: &ChannelDef, log: &mut ValidationLog) -> bool {
        match def {
            ChannelDef::Value(value) => match self.is_valid_mark_definition(value) {
                Ok(()) => true,
                Err(e) => {
                    log.record(e.to_string());
                    false
                }
            },
            ChannelDef::Field(_) => true,
        }
    }

    /// Measurement type used when a field definition does not name one
    fn default_measurement_type(&self) -> MeasurementType {
        self.allowed_measurement_types()
            .first()
            .copied()
            .unwrap_or(MeasurementType::Quantitative)
    }

    fn validate_measurement_type(&self, measurement: MeasurementType) -> Result<()> {
        let allowed = self.allowed_measurement_types();
        if allowed.contains(&measurement) {
            return Ok(());
        }
        let names: Vec<String> = allowed.iter().map(|m| m.to_string()).collect();
        Err(VislayerError::PropertyValidationError(format!(
            "Channel '{}' does not accept measurement type '{}'. Allowed types are: {}",
            self.info().channel,
            measurement,
            names.join(", ")
        )))
    }

    /// Scale a field binding references when the spec asks for none
    fn build_default_scale_definition(&self, _ctx: &RenderContext<'_>) -> Option<String> {
        None
    }

    /// Check that the render context permits this channel
    fn validate_context(&self, _ctx: &RenderContext<'_>) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Property Wrapper
// =============================================================================

/// Shared handle to a descriptor
#[derive(Clone)]
pub struct Property(Arc<dyn PropertyTrait>);

impl Property {
    /// Wrap any descriptor implementation
    pub fn new(inner: impl PropertyTrait + 'static) -> Self {
        Self(Arc::new(inner))
    }

    pub fn kind(&self) -> PropertyKind {
        self.0.kind()
    }

    pub fn channel(&self) -> &'static str {
        self.0.info().channel
    }

    pub fn outputs(&self) -> &'static [&'static str] {
        self.0.info().outputs
    }

    pub fn location(&self) -> SearchLocation {
        self.0.info().location
    }

    pub fn fallback(&self) -> Option<&Property> {
        self.0.info().fallback.as_ref()
    }

    pub fn is_scale_eligible(&self) -> bool {
        self.0.is_scale_eligible()
    }

    pub fn is_valid_mark_definition(&self, value: &Value) -> Result<()> {
        self.0.is_valid_mark_definition(value)
    }

    pub fn is_valid_value_definition(&self, def: &ChannelDef, log: &mut ValidationLog) -> bool {
        self.0.is_valid_value_definition(def, log)
    }

    pub fn default_measurement_type(&self) -> MeasurementType {
        self.0.default_measurement_type()
    }

    pub fn validate_measurement_type(&self, measurement: MeasurementType) -> Result<()> {
        self.0.validate_measurement_type(measurement)
    }

    pub fn build_default_scale_definition(&self, ctx: &RenderContext<'_>) -> Option<String> {
        self.0.build_default_scale_definition(ctx)
    }

    pub fn validate_context(&self, ctx: &RenderContext<'_>) -> Result<()> {
        self.0.validate_context(ctx)
    }

    /// This descriptor followed by its fallback chain
    pub fn chain(&self) -> impl Iterator<Item = &Property> {
        std::iter::successors(Some(self), |&p| p.fallback())
    }
}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Property::{}({})", self.kind(), self.channel())
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<NumericProperty> for Property {
    fn from(p: NumericProperty) -> Self {
        Self::new(p)
    }
}

impl From<ColorProperty> for Property {
    fn from(p: ColorProperty) -> Self {
        Self::new(p)
    }
}

impl From<PositionProperty> for Property {
    fn from(p: PositionProperty) -> Self {
        Self::new(p)
    }
}

impl From<GeographicProperty> for Property {
    fn from(p: GeographicProperty) -> Self {
        Self::new(p)
    }
}

impl From<EnumeratedProperty> for Property {
    fn from(p: EnumeratedProperty) -> Self {
        Self::new(p)
    }
}

/// Error for a literal value that fails a descriptor's checks
pub(crate) fn invalid_value(channel: &str, value: &Value, expected: &str) -> VislayerError {
    VislayerError::PropertyValidationError(format!(
        "Invalid value {} for channel '{}': expected {}",
        value, channel, expected
    ))
}
