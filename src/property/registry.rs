//! Per-layer-kind descriptor tables
//!
//! Registry order is resolution order. Tables are built once on first use
//! and shared read-only afterwards.

use super::{
    ColorProperty, EnumeratedProperty, GeographicProperty, NumericProperty, PositionProperty,
    Property, SearchLocation,
};
use crate::spec::{Axis, LayerKind};
use std::ops::Bound;
use std::sync::LazyLock;

/// Ordered descriptors for one layer kind
#[derive(Debug)]
pub struct Registry {
    layer_kind: LayerKind,
    properties: Vec<Property>,
}

static MESH2D: LazyLock<Registry> = LazyLock::new(|| Registry {
    layer_kind: LayerKind::Mesh2d,
    properties: vec![
        x(),
        y(),
        longitude(),
        latitude(),
        ColorProperty::new("fillColor", &["fillColor"]).into(),
        // Legacy alias of fillColor
        ColorProperty::new("color", &["fillColor"]).into(),
        opacity(),
    ],
});

static WINDBARB: LazyLock<Registry> = LazyLock::new(|| Registry {
    layer_kind: LayerKind::Windbarb,
    properties: vec![
        x(),
        y(),
        longitude(),
        latitude(),
        NumericProperty::new("size", &["size"]).positive().into(),
        NumericProperty::new("direction", &["direction"])
            .with_bounds(Bound::Included(0.0), Bound::Excluded(360.0))
            .into(),
        NumericProperty::new("speed", &["speed"]).non_negative().into(),
        ColorProperty::new("strokeColor", &["strokeColor"])
            .with_fallback(ColorProperty::new("color", &["strokeColor"]).into())
            .into(),
        stroke_width(),
        opacity(),
    ],
});

static CROSS_SECTION: LazyLock<Registry> = LazyLock::new(|| Registry {
    layer_kind: LayerKind::CrossSection,
    properties: vec![
        x(),
        y(),
        ColorProperty::new("strokeColor", &["strokeColor"]).into(),
        stroke_width(),
        opacity(),
        EnumeratedProperty::new("lineJoin", &["lineJoin"], &["miter", "round", "bevel"])
            .with_location(SearchLocation::MarkOnly)
            .into(),
    ],
});

fn x() -> Property {
    PositionProperty::new("x", &["x"], Axis::X).into()
}

fn y() -> Property {
    PositionProperty::new("y", &["y"], Axis::Y).into()
}

fn longitude() -> Property {
    GeographicProperty::new("longitude", &["x"], Axis::X).into()
}

fn latitude() -> Property {
    GeographicProperty::new("latitude", &["y"], Axis::Y).into()
}

fn opacity() -> Property {
    NumericProperty::new("opacity", &["opacity"])
        .unit_interval()
        .into()
}

fn stroke_width() -> Property {
    NumericProperty::new("strokeWidth", &["strokeWidth"])
        .non_negative()
        .into()
}

impl Registry {
    /// Shared registry for a layer kind
    pub fn for_layer(kind: LayerKind) -> &'static Registry {
        match kind {
            LayerKind::Mesh2d => &MESH2D,
            LayerKind::Windbarb => &WINDBARB,
            LayerKind::CrossSection => &CROSS_SECTION,
        }
    }

    pub fn layer_kind(&self) -> LayerKind {
        self.layer_kind
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Registered descriptor for a channel (fallbacks are not searched)
    pub fn get(&self, channel: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.channel() == channel)
    }

    /// Any descriptor reachable for a channel, registered or fallback
    pub fn find(&self, channel: &str) -> Option<&Property> {
        self.properties
            .iter()
            .flat_map(|p| p.chain())
            .find(|p| p.channel() == channel)
    }

    /// Registered descriptors writing a given mark-property output
    pub fn writers_of<'a>(&'a self, output: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.outputs().contains(&output))
    }

    /// Every channel name a spec may use, including fallback channels
    pub fn valid_channels(&self) -> Vec<&'static str> {
        let mut channels: Vec<&'static str> = Vec::new();
        for p in self.properties.iter().flat_map(|p| p.chain()) {
            if !channels.contains(&p.channel()) {
                channels.push(p.channel());
            }
        }
        channels
    }
}
