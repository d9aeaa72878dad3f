//! Extent checks and extents derived from datasets

use crate::core::envelope::{check_extent, z_factor, ExtentPolicy, Relation};
use crate::core::observer::{observer_extent, Observer};
use crate::io::engine::{DatasetDescription, GeoprocessingEngine};
use crate::io::options::ToolContext;
use crate::types::{Envelope, MaError, MaResult, SpatialReference, SpatialReferenceKind};
use std::path::Path;

fn describe_existing<E: GeoprocessingEngine + ?Sized>(
    engine: &E,
    dataset: &Path,
) -> MaResult<DatasetDescription> {
    if !engine.exists(dataset) {
        return Err(MaError::DatasetNotFound(dataset.display().to_string()));
    }
    engine.describe(dataset)
}

fn extent_of(description: &DatasetDescription) -> MaResult<Envelope> {
    description.extent.ok_or_else(|| {
        MaError::ExtentMismatch(format!("{} has no extent", description.path.display()))
    })
}

/// Check that `subject` lies within (or, with `AnyOverlap`, touches) `reference`
pub fn check_extents<E: GeoprocessingEngine + ?Sized>(
    engine: &E,
    subject: &Path,
    reference: &Path,
    policy: ExtentPolicy,
) -> MaResult<Relation> {
    let subject_extent = extent_of(&describe_existing(engine, subject)?)?;
    let reference_extent = extent_of(&describe_existing(engine, reference)?)?;
    check_extent(&subject_extent, &reference_extent, policy)
}

/// Check a dataset against the processing extent of the context, if one is set
pub fn check_context_extent<E: GeoprocessingEngine + ?Sized>(
    engine: &E,
    ctx: &ToolContext,
    dataset: &Path,
    policy: ExtentPolicy,
) -> MaResult<Option<Relation>> {
    let Some(processing) = ctx.extent else {
        return Ok(None);
    };
    let extent = extent_of(&describe_existing(engine, dataset)?)?;
    check_extent(&extent, &processing, policy).map(Some)
}

/// Degrees-per-meter z-factor of a geographic dataset
pub fn dataset_z_factor<E: GeoprocessingEngine + ?Sized>(engine: &E, dataset: &Path) -> MaResult<f64> {
    let description = describe_existing(engine, dataset)?;
    let geographic = description
        .spatial_reference
        .as_ref()
        .map(SpatialReference::is_geographic)
        .unwrap_or(false);
    if !geographic {
        return Err(MaError::InvalidParameter(format!(
            "The dataset {} is not in geographic coordinates.",
            dataset.display()
        )));
    }
    z_factor(extent_of(&description)?.mid_latitude())
}

/// Extent of an observer feature class grown by its largest search radius.
///
/// Radii are read in the context's distance units.
pub fn observer_analysis_extent<E: GeoprocessingEngine + ?Sized>(
    engine: &E,
    ctx: &ToolContext,
    observers: &Path,
) -> MaResult<Envelope> {
    let description = describe_existing(engine, observers)?;
    let sr = description.spatial_reference.clone().unwrap_or(SpatialReference {
        name: "Unknown".to_string(),
        kind: SpatialReferenceKind::Unknown,
    });
    let extent = extent_of(&description)?;

    let points = engine
        .rows(observers)?
        .iter()
        .map(|row| Observer::from_row(row, sr.clone()))
        .collect::<MaResult<Vec<_>>>()?;
    log::debug!("{} observers in {}", points.len(), observers.display());

    observer_extent(&extent, &points, ctx.distance_units(), &sr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::engine::{DatasetType, MemoryEngine};
    use crate::types::GeometryType;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    fn raster(engine: &mut MemoryEngine, name: &str, extent: Envelope) -> PathBuf {
        let path = PathBuf::from("/data").join(name);
        engine.add_dataset(
            DatasetDescription::new(&path, DatasetType::RasterDataset)
                .with_extent(extent)
                .with_spatial_reference(SpatialReference::geographic_wgs84()),
        );
        path
    }

    #[test]
    fn test_check_extents() {
        let mut engine = MemoryEngine::new();
        let dem = raster(&mut engine, "dem.tif", Envelope::new(0.0, 0.0, 10.0, 10.0));
        let inner = raster(&mut engine, "inner.tif", Envelope::new(2.0, 2.0, 4.0, 4.0));
        let far = raster(&mut engine, "far.tif", Envelope::new(20.0, 20.0, 30.0, 30.0));

        let relation = check_extents(&engine, &inner, &dem, ExtentPolicy::ContainedOnly).unwrap();
        assert_eq!(relation.code(), 0);
        assert!(check_extents(&engine, &far, &dem, ExtentPolicy::AnyOverlap).is_err());
        assert!(matches!(
            check_extents(&engine, Path::new("/nope"), &dem, ExtentPolicy::AnyOverlap),
            Err(MaError::DatasetNotFound(_))
        ));

        let ctx = ToolContext::new("/data").with_extent(Envelope::new(1.0, 1.0, 5.0, 5.0));
        let checked = check_context_extent(&engine, &ctx, &inner, ExtentPolicy::ContainedOnly);
        assert!(checked.unwrap().is_some());
        let unrestricted = ToolContext::new("/data");
        assert!(check_context_extent(&engine, &unrestricted, &far, ExtentPolicy::ContainedOnly)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_dataset_z_factor() {
        let mut engine = MemoryEngine::new();
        let dem = raster(&mut engine, "dem.tif", Envelope::new(0.0, 59.0, 1.0, 61.0));
        assert_relative_eq!(dataset_z_factor(&engine, &dem).unwrap(), 0.000018);

        engine.add_dataset(
            DatasetDescription::new("/data/utm.tif", DatasetType::RasterDataset)
                .with_extent(Envelope::new(0.0, 0.0, 1.0, 1.0))
                .with_spatial_reference(SpatialReference::projected("UTM", "meters")),
        );
        assert!(dataset_z_factor(&engine, Path::new("/data/utm.tif")).is_err());
    }

    #[test]
    fn test_observer_analysis_extent() {
        let mut engine = MemoryEngine::new();
        let sr = SpatialReference::projected("UTM_38N", "meters");
        engine.add_dataset(
            DatasetDescription::new("/ws/obs.shp", DatasetType::FeatureClass(GeometryType::Point))
                .with_extent(Envelope::new(100.0, 100.0, 200.0, 200.0))
                .with_spatial_reference(sr.clone()),
        );
        let fc = Path::new("/ws/obs.shp");
        crate::tools::observers::add_observer_fields(&mut engine, fc).unwrap();
        let mut observer = Observer::at(150.0, 150.0);
        observer.spatial_reference = sr;
        observer.radius2 = 2.0;
        crate::tools::observers::add_observer(&mut engine, fc, &observer).unwrap();

        let ctx = ToolContext::new("/ws");
        let extent = observer_analysis_extent(&engine, &ctx, fc).unwrap();
        assert_relative_eq!(extent.left, 97.0);
        assert_relative_eq!(extent.top, 203.0);
    }
}
