//! Deferred realignment of already-materialized output
//!
//! Some transforms produce columns whose names depend on how channels were
//! bound, which is only known after descriptor resolution. They queue a
//! `Realignment` command; `drain` runs the queue in FIFO order once every
//! channel has resolved and leaves it empty.

use crate::accumulator::{Binding, CoordNames, DataFormat, OutputAccumulator};
use crate::naming;
use crate::property::Registry;
use crate::{Result, VislayerError};

/// Pending fixup, one variant per transform kind that needs one
#[derive(Debug, Clone, PartialEq)]
pub enum Realignment {
    /// Record the mesh coordinate columns and point x/y at the decoded mesh
    RasterMesh2d,
    /// Check x/y are bound to the cut's output columns and drop their raw projections
    CrossSection2d { z: String, dimension_name: String },
}

/// Run every queued realignment in registration order, then clear the queue
pub fn drain(registry: &Registry, acc: &mut OutputAccumulator) -> Result<()> {
    while let Some(realignment) = acc.realignments.pop_front() {
        tracing::debug!(?realignment, "running realignment");
        apply(&realignment, registry, acc)?;
    }
    Ok(())
}

/// Execute one realignment command
pub fn apply(realignment: &Realignment, registry: &Registry, acc: &mut OutputAccumulator) -> Result<()> {
    match realignment {
        Realignment::RasterMesh2d => realign_mesh(registry, acc),
        Realignment::CrossSection2d { z, dimension_name } => {
            realign_cross_section(z, dimension_name, acc)
        }
    }
}

fn realign_mesh(registry: &Registry, acc: &mut OutputAccumulator) -> Result<()> {
    let (x_channel, x_field) = field_bound_writer(registry, acc, "x")?;
    let (y_channel, y_field) = field_bound_writer(registry, acc, "y")?;

    match acc.data_format_mut() {
        Some(DataFormat::Mesh2d { coords }) => {
            *coords = Some(CoordNames {
                x: x_field,
                y: y_field,
                z: None,
            });
        }
        other => {
            return Err(VislayerError::InternalError(format!(
                "mesh realignment queued but data format is {:?}",
                other.map(|f| f.type_name())
            )))
        }
    }

    rename_field(acc, &x_channel, naming::MESH_X_COLUMN)?;
    rename_field(acc, &y_channel, naming::MESH_Y_COLUMN)?;
    Ok(())
}

/// Channel and field of the field-bound mark property writing `output`
fn field_bound_writer(
    registry: &Registry,
    acc: &OutputAccumulator,
    output: &str,
) -> Result<(String, String)> {
    acc.mark_properties
        .iter()
        .find_map(|(channel, property)| match &property.binding {
            Binding::Field { field, .. } if property.outputs.contains(&output) => {
                Some((channel.to_string(), field.clone()))
            }
            _ => None,
        })
        .ok_or_else(|| {
            let candidates: Vec<&str> = registry.writers_of(output).map(|p| p.channel()).collect();
            VislayerError::PropertyValidationError(format!(
                "rasterMesh2d requires the '{}' mark property to be bound to a field (via one of: {})",
                output,
                candidates.join(", ")
            ))
        })
}

fn rename_field(acc: &mut OutputAccumulator, channel: &str, column: &str) -> Result<()> {
    match acc.mark_properties.get_mut(channel).map(|p| &mut p.binding) {
        Some(Binding::Field { field, .. }) => {
            *field = column.to_string();
            Ok(())
        }
        _ => Err(VislayerError::InternalError(format!(
            "channel '{}' lost its field binding during realignment",
            channel
        ))),
    }
}

fn realign_cross_section(z: &str, dimension_name: &str, acc: &mut OutputAccumulator) -> Result<()> {
    for (channel, expected) in [("x", dimension_name), ("y", z)] {
        let found = match acc.mark_properties.get(channel).map(|p| &p.binding) {
            Some(Binding::Field { field, .. }) => field.clone(),
            Some(Binding::Value(_)) => "(literal value)".to_string(),
            None => "(unbound)".to_string(),
        };
        if found != expected {
            return Err(VislayerError::FieldMismatch {
                transform: "crossSection2d".to_string(),
                channel: channel.to_string(),
                expected: expected.to_string(),
                found,
            });
        }
        // The cut produces this column itself; a raw projection would fail or duplicate
        acc.query_transforms.remove(channel);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::{MarkProperty, QueryTransform};
    use crate::spec::LayerKind;
    use serde_json::json;

    fn bind_field(acc: &mut OutputAccumulator, channel: &str, outputs: &'static [&'static str], field: &str) {
        acc.mark_properties
            .insert(
                channel,
                MarkProperty {
                    outputs,
                    binding: Binding::field(field, Some("x".to_string())),
                },
            )
            .unwrap();
        acc.query_transforms
            .insert(channel, QueryTransform::project(field))
            .unwrap();
    }

    #[test]
    fn test_mesh_realignment_records_coords_and_renames() {
        let registry = Registry::for_layer(LayerKind::Mesh2d);
        let mut acc = OutputAccumulator::new();
        acc.set_data_format(DataFormat::Mesh2d { coords: None }).unwrap();
        bind_field(&mut acc, "longitude", &["x"], "lon");
        bind_field(&mut acc, "latitude", &["y"], "lat");
        acc.push_realignment(Realignment::RasterMesh2d);

        drain(registry, &mut acc).unwrap();

        assert!(acc.realignments.is_empty());
        assert_eq!(
            acc.data_format(),
            Some(&DataFormat::Mesh2d {
                coords: Some(CoordNames {
                    x: "lon".to_string(),
                    y: "lat".to_string(),
                    z: None
                })
            })
        );
        let lon = acc.mark_properties.get("longitude").unwrap();
        assert_eq!(lon.binding.field_name(), Some("x"));
        let lat = acc.mark_properties.get("latitude").unwrap();
        assert_eq!(lat.binding.field_name(), Some("y"));
        // Raw coordinate projections feed the mesh decoder and stay
        assert_eq!(acc.query_transforms.len(), 2);
    }

    #[test]
    fn test_mesh_realignment_requires_field_bound_position() {
        let registry = Registry::for_layer(LayerKind::Mesh2d);
        let mut acc = OutputAccumulator::new();
        acc.set_data_format(DataFormat::Mesh2d { coords: None }).unwrap();
        bind_field(&mut acc, "x", &["x"], "lon");

        let err = apply(&Realignment::RasterMesh2d, registry, &mut acc).unwrap_err();
        assert!(matches!(err, VislayerError::PropertyValidationError(_)));
        assert!(err.to_string().contains("y, latitude"));
    }

    #[test]
    fn test_cross_section_realignment_drops_projections() {
        let registry = Registry::for_layer(LayerKind::CrossSection);
        let mut acc = OutputAccumulator::new();
        bind_field(&mut acc, "x", &["x"], "distance");
        bind_field(&mut acc, "y", &["y"], "elev");
        let z_key = naming::transform_projection("crossSection2d", "z");
        acc.query_transforms
            .insert(z_key.clone(), QueryTransform::project("elev"))
            .unwrap();
        acc.query_transforms
            .insert("x", QueryTransform::project("distance"))
            .unwrap();
        acc.query_transforms
            .insert("y", QueryTransform::project("elev"))
            .unwrap();
        acc.push_realignment(Realignment::CrossSection2d {
            z: "elev".to_string(),
            dimension_name: "distance".to_string(),
        });

        drain(registry, &mut acc).unwrap();

        assert_eq!(acc.query_transforms.keys().collect::<Vec<_>>(), vec![z_key.as_str()]);
        assert_eq!(
            acc.mark_properties.get("x").unwrap().binding.field_name(),
            Some("distance")
        );
        assert_eq!(
            acc.mark_properties.get("y").unwrap().binding.field_name(),
            Some("elev")
        );
    }

    #[test]
    fn test_cross_section_realignment_mismatch() {
        let registry = Registry::for_layer(LayerKind::CrossSection);
        let mut acc = OutputAccumulator::new();
        bind_field(&mut acc, "x", &["x"], "lon");
        bind_field(&mut acc, "y", &["y"], "elev");
        acc.push_realignment(Realignment::CrossSection2d {
            z: "elev".to_string(),
            dimension_name: "distance".to_string(),
        });

        match drain(registry, &mut acc).unwrap_err() {
            VislayerError::FieldMismatch {
                channel,
                expected,
                found,
                ..
            } => {
                assert_eq!(channel, "x");
                assert_eq!(expected, "distance");
                assert_eq!(found, "lon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cross_section_realignment_literal_y() {
        let registry = Registry::for_layer(LayerKind::CrossSection);
        let mut acc = OutputAccumulator::new();
        bind_field(&mut acc, "x", &["x"], "distance");
        acc.mark_properties
            .insert(
                "y",
                MarkProperty {
                    outputs: &["y"],
                    binding: Binding::Value(json!(3)),
                },
            )
            .unwrap();
        acc.push_realignment(Realignment::CrossSection2d {
            z: "elev".to_string(),
            dimension_name: "distance".to_string(),
        });

        let err = drain(registry, &mut acc).unwrap_err();
        assert!(err.to_string().contains("(literal value)"));
    }
}
