//! Observer feature class tools

use crate::core::observer::{missing_observer_fields, Observer, ObserverParams};
use crate::core::schema::{observer_fields, FieldValue, Row, OBSERVER_FIELDS};
use crate::io::engine::{DatasetType, GeoprocessingEngine};
use crate::types::{GeometryType, MaError, MaResult, SpatialReference, WorkspaceKind};
use std::path::{Path, PathBuf};

fn require_dataset<E: GeoprocessingEngine + ?Sized>(engine: &E, dataset: &Path) -> MaResult<()> {
    if engine.exists(dataset) {
        Ok(())
    } else {
        Err(MaError::DatasetNotFound(dataset.display().to_string()))
    }
}

fn delete_quietly<E: GeoprocessingEngine + ?Sized>(engine: &mut E, dataset: &Path) {
    if let Err(e) = engine.delete(dataset) {
        log::warn!("Could not remove {}: {}", dataset.display(), e);
    }
}

/// Default value of each observer field, in `OBSERVER_FIELDS` order
fn observer_defaults() -> [(&'static str, f64); 8] {
    let d = Observer::default();
    [
        ("OFFSETA", d.offset_a),
        ("OFFSETB", d.offset_b),
        ("VERT1", d.vert1),
        ("VERT2", d.vert2),
        ("AZIMUTH1", d.azimuth1),
        ("AZIMUTH2", d.azimuth2),
        ("RADIUS1", d.radius1),
        ("RADIUS2", d.radius2),
    ]
}

/// Add the eight observer fields to a point or polyline feature class and
/// fill existing features with default values.
///
/// Fails without changes if any observer field is already present.
/// Returns the number of features that received defaults.
pub fn add_observer_fields<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    dataset: &Path,
) -> MaResult<usize> {
    require_dataset(engine, dataset)?;
    match engine.describe(dataset)?.dataset_type {
        DatasetType::FeatureClass(GeometryType::Point)
        | DatasetType::FeatureClass(GeometryType::Polyline) => {}
        _ => {
            return Err(MaError::InvalidParameter(
                "Input dataset must be a point or polyline feature class.".to_string(),
            ))
        }
    }

    let present = engine.list_fields(dataset)?;
    let missing = missing_observer_fields(&present);
    let existing: Vec<&str> = OBSERVER_FIELDS
        .iter()
        .copied()
        .filter(|f| !missing.iter().any(|m| m.as_str() == *f))
        .collect();
    if !existing.is_empty() {
        return Err(MaError::AlreadyExists(format!(
            "observer fields {:?} in {}",
            existing,
            dataset.display()
        )));
    }

    for field in observer_fields() {
        engine.add_field(dataset, &field)?;
    }

    let defaults = observer_defaults();
    let updated = engine.update_rows(dataset, &mut |row: &mut Row| {
        for (name, value) in defaults {
            row.set(name, FieldValue::Double(value));
        }
    })?;
    log::info!(
        "Finished adding observer fields to {} ({} features set to defaults)",
        dataset.display(),
        updated
    );
    Ok(updated)
}

/// Insert one observer into an observer feature class.
///
/// The target must exist, hold points or multipoints, share the observer's
/// spatial reference and carry all observer fields.
pub fn add_observer<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    dataset: &Path,
    observer: &Observer,
) -> MaResult<()> {
    require_dataset(engine, dataset)?;
    let description = engine.describe(dataset)?;
    if !description.is_point_feature_class() {
        return Err(MaError::WrongGeometry(dataset.display().to_string()));
    }

    if let Some(sr) = &description.spatial_reference {
        if sr.name != observer.spatial_reference.name {
            return Err(MaError::SpatialReferenceMismatch {
                expected: sr.name.clone(),
                found: observer.spatial_reference.name.clone(),
            });
        }
    }

    let missing = missing_observer_fields(&engine.list_fields(dataset)?);
    if !missing.is_empty() {
        return Err(MaError::MissingFields {
            dataset: dataset.display().to_string(),
            fields: missing,
        });
    }

    log::info!("Adding observer at {} , {}", observer.x, observer.y);
    engine.insert_row(dataset, observer.to_row())
}

/// Shapefile name for folder workspaces, the name as given elsewhere
fn feature_class_name(workspace: &Path, name: &str) -> String {
    let is_folder = WorkspaceKind::detect(workspace) == WorkspaceKind::FileSystem;
    if is_folder && !name.to_ascii_lowercase().ends_with(".shp") {
        format!("{}.shp", name)
    } else {
        name.to_string()
    }
}

/// Create an empty point feature class with observer fields
fn create_observer_feature_class<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    workspace: &Path,
    name: &str,
    sr: &SpatialReference,
) -> MaResult<PathBuf> {
    let name = feature_class_name(workspace, name);
    let target = workspace.join(&name);
    if engine.exists(&target) {
        return Err(MaError::AlreadyExists(target.display().to_string()));
    }

    let fc = engine.create_feature_class(workspace, &name, GeometryType::Point, sr)?;
    if let Err(e) = add_observer_fields(engine, &fc) {
        delete_quietly(engine, &fc);
        return Err(e);
    }
    Ok(fc)
}

/// Create a feature class holding a single observer built from tool parameters
pub fn create_single_observer<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    workspace: &Path,
    name: &str,
    params: &ObserverParams,
    sr: Option<SpatialReference>,
) -> MaResult<PathBuf> {
    let observer = Observer::from_params(params, sr)?;
    let fc = create_observer_feature_class(engine, workspace, name, &observer.spatial_reference)?;
    if let Err(e) = add_observer(engine, &fc, &observer) {
        delete_quietly(engine, &fc);
        return Err(e);
    }
    Ok(fc)
}

fn params_from_row(row: &Row) -> ObserverParams {
    let text = |field: &str| row.get(field).and_then(FieldValue::as_text);
    ObserverParams {
        x: text("X"),
        y: text("Y"),
        z: text("Z"),
        offset_a: text("OFFSETA"),
        offset_b: text("OFFSETB"),
        radius1: text("RADIUS1"),
        radius2: text("RADIUS2"),
        azimuth1: text("AZIMUTH1"),
        azimuth2: text("AZIMUTH2"),
        vert1: text("VERT1"),
        vert2: text("VERT2"),
    }
}

/// Create an observer feature class from a table with X, Y and optional modifier columns.
///
/// Blank modifier values take the observer defaults. Returns the new
/// feature class and the number of observers written.
pub fn create_observers_from_table<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    table: &Path,
    workspace: &Path,
    name: &str,
    sr: Option<SpatialReference>,
) -> MaResult<(PathBuf, usize)> {
    require_dataset(engine, table)?;
    let fields = engine.list_fields(table)?;
    let has = |name: &str| fields.iter().any(|f| f.eq_ignore_ascii_case(name));
    let coords: Vec<String> = ["X", "Y"]
        .iter()
        .filter(|f| !has(**f))
        .map(|f| f.to_string())
        .collect();
    if !coords.is_empty() {
        return Err(MaError::MissingFields {
            dataset: table.display().to_string(),
            fields: coords,
        });
    }

    let sr = sr.unwrap_or_else(SpatialReference::geographic_wgs84);
    let rows = engine.rows(table)?;
    log::info!("Reading input table {} ({} rows)", table.display(), rows.len());

    let fc = create_observer_feature_class(engine, workspace, name, &sr)?;
    for row in &rows {
        let added = Observer::from_params(&params_from_row(row), Some(sr.clone()))
            .and_then(|observer| add_observer(engine, &fc, &observer));
        if let Err(e) = added {
            delete_quietly(engine, &fc);
            return Err(e);
        }
    }

    log::info!("Processing completed.");
    Ok((fc, rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::FieldDef;
    use crate::io::engine::MemoryEngine;
    use crate::types::Point;

    fn point_fc(engine: &mut MemoryEngine) -> PathBuf {
        engine
            .create_feature_class(
                Path::new("/ws/a.gdb"),
                "obs",
                GeometryType::Point,
                &SpatialReference::geographic_wgs84(),
            )
            .unwrap()
    }

    #[test]
    fn test_add_observer_fields_sets_defaults() {
        let mut engine = MemoryEngine::new();
        let fc = point_fc(&mut engine);
        engine
            .insert_row(&fc, Row::with_geometry(Point { x: 1.0, y: 2.0, z: None }))
            .unwrap();

        assert_eq!(add_observer_fields(&mut engine, &fc).unwrap(), 1);
        let row = &engine.rows(&fc).unwrap()[0];
        assert_eq!(row.get("RADIUS2"), Some(&FieldValue::Double(1000.0)));
        assert_eq!(row.get("VERT2"), Some(&FieldValue::Double(-90.0)));

        assert!(matches!(
            add_observer_fields(&mut engine, &fc),
            Err(MaError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_add_observer_validation() {
        let mut engine = MemoryEngine::new();
        let fc = point_fc(&mut engine);
        let observer = Observer::at(10.0, 20.0);

        assert!(matches!(
            add_observer(&mut engine, &fc, &observer),
            Err(MaError::MissingFields { .. })
        ));

        add_observer_fields(&mut engine, &fc).unwrap();
        add_observer(&mut engine, &fc, &observer).unwrap();

        let mut projected = observer.clone();
        projected.spatial_reference = SpatialReference::projected("UTM_38N", "meters");
        assert!(matches!(
            add_observer(&mut engine, &fc, &projected),
            Err(MaError::SpatialReferenceMismatch { .. })
        ));

        let missing = Path::new("/ws/a.gdb/none");
        assert!(matches!(
            add_observer(&mut engine, missing, &observer),
            Err(MaError::DatasetNotFound(_))
        ));

        let lines = engine
            .create_feature_class(
                Path::new("/ws/a.gdb"),
                "lines",
                GeometryType::Polyline,
                &SpatialReference::geographic_wgs84(),
            )
            .unwrap();
        assert!(matches!(
            add_observer(&mut engine, &lines, &observer),
            Err(MaError::WrongGeometry(_))
        ));
    }

    #[test]
    fn test_create_single_observer_in_folder() {
        let mut engine = MemoryEngine::new();
        let params = ObserverParams {
            x: Some("44.1".to_string()),
            y: Some("33.3".to_string()),
            z: Some("120".to_string()),
            offset_a: Some("2".to_string()),
            ..Default::default()
        };

        let fc = create_single_observer(&mut engine, Path::new("/ws"), "obs", &params, None)
            .unwrap();
        assert_eq!(fc, PathBuf::from("/ws/obs.shp"));
        let rows = engine.rows(&fc).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].geometry.unwrap().z, Some(122.0));
    }

    #[test]
    fn test_create_observers_from_table() {
        let mut engine = MemoryEngine::new();
        let table = engine.create_table(Path::new("/ws/a.gdb"), "points").unwrap();
        engine.add_field(&table, &FieldDef::double("X")).unwrap();

        let result =
            create_observers_from_table(&mut engine, &table, Path::new("/ws/a.gdb"), "obs", None);
        match result {
            Err(MaError::MissingFields { fields, .. }) => assert_eq!(fields, vec!["Y"]),
            other => panic!("unexpected result: {:?}", other),
        }

        engine.add_field(&table, &FieldDef::double("Y")).unwrap();
        engine.add_field(&table, &FieldDef::double("RADIUS2")).unwrap();
        let mut row = Row::new();
        row.set("X", FieldValue::Double(44.0));
        row.set("Y", FieldValue::Double(33.0));
        row.set("RADIUS2", FieldValue::Double(5000.0));
        engine.insert_row(&table, row).unwrap();
        let mut row = Row::new();
        row.set("X", FieldValue::Double(45.0));
        row.set("Y", FieldValue::Double(34.0));
        row.set("RADIUS2", FieldValue::Null);
        engine.insert_row(&table, row).unwrap();

        let (fc, count) =
            create_observers_from_table(&mut engine, &table, Path::new("/ws/a.gdb"), "obs", None)
                .unwrap();
        assert_eq!(count, 2);
        let rows = engine.rows(&fc).unwrap();
        assert_eq!(rows[0].get("RADIUS2"), Some(&FieldValue::Double(5000.0)));
        assert_eq!(rows[1].get("RADIUS2"), Some(&FieldValue::Double(1000.0)));
    }
}
