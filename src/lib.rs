/*!
# vislayer - Layer Spec Compiler

Compiles a declarative, per-layer visualization spec into the two artifacts
a chart needs for that layer: an ordered list of query-transform steps
(which become a SQL statement) and a render-spec fragment (data format,
scales, mark-property bindings, legend bindings).

## Example

```json
{
  "mark": {"type": "mesh", "opacity": 0.8},
  "encoding": {
    "longitude": {"field": "lon"},
    "latitude": {"field": "lat"},
    "fillColor": {"field": "t2m", "scale": {"type": "sequential"}, "legend": {}}
  },
  "transform": [{"type": "rasterMesh2d"}],
  "config": {"mesh": {"opacity": 1}}
}
```

## Architecture

One compilation is a pure, synchronous pass:
- **Definition wrappers** parse `encoding`, `mark` and `config`
- **Transforms** parse `transform` and seed the output accumulator
- **Descriptor resolution** binds every channel of the layer's registry
  (transform output, then encoding, mark, fallback chain, config)
- **Realignment** patches column names only known after resolution
- **Flatten** produces an [`OutputBundle`]

## Core Components

- [`spec`] - Typed layer spec and render context
- [`property`] - Channel descriptors and per-layer-kind registries
- [`definition`] - Config / encoding / mark wrappers
- [`transform`] - Transform pipeline
- [`accumulator`] - Output accumulator and bundle
- [`compile`] - Materialization driver
- [`writer`] - SQL and render-fragment writers
*/

pub mod accumulator;
pub mod compile;
pub mod definition;
pub mod naming;
pub mod property;
pub mod realign;
pub mod spec;
pub mod transform;

#[cfg(feature = "writer")]
pub mod writer;

// Re-export key types for convenience
pub use accumulator::{DataFormat, OutputAccumulator, OutputBundle, QueryTransform};
pub use compile::{compile, compile_layer, Resolution};
pub use property::{Property, PropertyKind, Registry};
pub use spec::{ChartHandle, ChartSettings, LayerKind, LayerSpec, MarkKind, RenderContext};

/// Main library error type
#[derive(thiserror::Error, Debug)]
pub enum VislayerError {
    #[error("Spec parse error: {0}")]
    SpecParseError(String),

    #[error("Property validation error: {0}")]
    PropertyValidationError(String),

    #[error("Context validation error: {0}")]
    ContextValidationError(String),

    #[error("Channels '{first}' and '{second}' both write mark property '{output}'")]
    CollisionError {
        output: String,
        first: String,
        second: String,
    },

    #[error("Transform '{transform}' requires channel '{channel}' to be bound to field '{expected}', found {found}")]
    FieldMismatch {
        transform: String,
        channel: String,
        expected: String,
        found: String,
    },

    #[error("Output generation error: {0}")]
    WriterError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, VislayerError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(all(test, feature = "writer"))]
mod integration_tests {
    use super::*;
    use serde_json::json;

    /// Chart whose axis scales are named after the chart
    #[derive(Debug)]
    struct NamedChart;

    impl ChartHandle for NamedChart {
        fn uses_geographic_coordinates(&self) -> bool {
            true
        }

        fn default_scale_name(&self, axis: spec::Axis) -> String {
            format!("map_{}", axis)
        }
    }

    #[test]
    fn test_windbarb_end_to_end() {
        let chart = NamedChart;
        let ctx = RenderContext::new("obs", LayerKind::Windbarb, "wind", &chart)
            .with_last_filtered_row_count(20_000);
        let spec = json!({
            "mark": {"type": "windbarb", "strokeWidth": 1.5},
            "encoding": {
                "longitude": {"field": "lon"},
                "latitude": {"field": "lat"},
                "direction": {"field": "wd"},
                "speed": {"field": "ws"},
                "color": {"value": "#333"}
            },
            "transform": [
                {"type": "filter", "expr": "ws IS NOT NULL"},
                {"type": "sample", "size": 1000000, "limit": 5000}
            ],
            "config": {"mark": {"opacity": 0.9}, "windbarb": {"size": 24}}
        });

        let bundle = compile(&spec, &ctx).unwrap();
        let sql = writer::to_sql(&ctx, &bundle).unwrap();
        assert_eq!(
            sql,
            r#"SELECT "lon", "lat", "wd", "ws" FROM obs WHERE (ws IS NOT NULL) AND MOD(rowid * 265445761, 4294967296) < 1073741824"#
        );

        let fragment = writer::to_render_layer(&ctx, &bundle).unwrap();
        assert_eq!(
            fragment["mark"]["properties"],
            json!({
                "x": {"field": "lon", "scale": "map_x"},
                "y": {"field": "lat", "scale": "map_y"},
                "direction": {"field": "wd"},
                "speed": {"field": "ws"},
                "strokeColor": {"value": "#333"},
                "strokeWidth": {"value": 1.5},
                "size": {"value": 24},
                "opacity": {"value": 0.9}
            })
        );
        assert!(fragment["data"].get("format").is_none());
    }

    #[test]
    fn test_cross_section_end_to_end() {
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("volume", LayerKind::CrossSection, "cut", &chart);
        let spec = json!({
            "mark": {"type": "line", "lineJoin": "round"},
            "encoding": {
                "x": {"field": "km"},
                "y": {"field": "temp"},
                "strokeColor": {"value": "steelblue"}
            },
            "transform": [{
                "type": "crossSection2d",
                "x": "lon", "y": "lat", "z": "temp",
                "crossSectionLine": [[10, 45], [12, 47]],
                "dimensionName": "km"
            }]
        });

        let bundle = compile(&spec, &ctx).unwrap();
        assert_eq!(
            writer::to_sql(&ctx, &bundle).unwrap(),
            r#"SELECT "lon", "lat", "temp" FROM volume"#
        );
        let fragment = writer::to_render_layer(&ctx, &bundle).unwrap();
        assert_eq!(
            fragment["data"]["format"],
            json!({
                "type": "crosssection2d",
                "coords": {"x": "lon", "y": "lat", "z": "temp"},
                "crossSectionLine": [[10.0, 45.0], [12.0, 47.0]],
                "dimensionName": "km"
            })
        );
        assert_eq!(fragment["mark"]["properties"]["lineJoin"], json!({"value": "round"}));
    }

    #[test]
    fn test_aggregated_columns_keep_distinct_names() {
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("obs", LayerKind::Windbarb, "wind", &chart);

        let spec = json!({"encoding": {
            "x": {"field": "lon"},
            "speed": {"field": "ws", "aggregate": "avg"},
            "size": {"field": "ws"}
        }});
        let bundle = compile(&spec, &ctx).unwrap();
        assert_eq!(
            writer::to_sql(&ctx, &bundle).unwrap(),
            r#"SELECT "lon", "ws", AVG("ws") AS "avg_ws" FROM obs GROUP BY "lon", "ws""#
        );

        let spec = json!({"encoding": {
            "speed": {"field": "ws", "aggregate": "avg"},
            "size": {"field": "ws", "aggregate": "max"}
        }});
        let bundle = compile(&spec, &ctx).unwrap();
        assert_eq!(
            writer::to_sql(&ctx, &bundle).unwrap(),
            r#"SELECT MAX("ws") AS "max_ws", AVG("ws") AS "avg_ws" FROM obs"#
        );
    }

    #[test]
    fn test_line_join_rejects_unknown_choice() {
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("volume", LayerKind::CrossSection, "cut", &chart);
        let err = compile(&json!({"mark": {"lineJoin": "square"}}), &ctx).unwrap_err();
        assert!(matches!(err, VislayerError::PropertyValidationError(_)));
    }

    #[test]
    fn test_geographic_channel_on_cartesian_chart() {
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("obs", LayerKind::Windbarb, "wind", &chart);
        let err = compile(&json!({"encoding": {"longitude": {"field": "lon"}}}), &ctx).unwrap_err();
        assert!(matches!(err, VislayerError::ContextValidationError(_)));
    }

    #[test]
    fn test_bundle_serialization_keys() {
        let chart = ChartSettings::cartesian();
        let ctx = RenderContext::new("obs", LayerKind::Windbarb, "wind", &chart);
        let bundle = compile(&json!({"encoding": {"x": {"field": "lon"}}}), &ctx).unwrap();
        let value = serde_json::to_value(&bundle).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(|k| k.as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "mark",
                "queryTransforms",
                "dataFormats",
                "renderTransforms",
                "scales",
                "markProperties",
                "legendBindings"
            ]
        );
    }

    #[test]
    fn test_concurrent_compilations_share_registry() {
        let spec = json!({
            "encoding": {"x": {"field": "lon"}, "y": {"field": "lat"}},
            "mark": {"size": 12}
        });
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let spec = spec.clone();
                std::thread::spawn(move || {
                    let chart = ChartSettings::cartesian();
                    let name = format!("wind{}", i);
                    let ctx = RenderContext::new("obs", LayerKind::Windbarb, &name, &chart);
                    compile(&spec, &ctx).unwrap()
                })
            })
            .collect();
        let bundles: Vec<OutputBundle> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(bundles.windows(2).all(|w| w[0] == w[1]));
    }
}
