//! Raster properties read through GDAL, for catalog loading

use crate::io::engine::{DatasetDescription, DatasetType};
use crate::types::{Envelope, MaResult, SpatialReference, SpatialReferenceKind};
use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use std::path::Path;

/// Raster reader for the properties the catalog loader needs
pub struct RasterReader;

impl RasterReader {
    /// Extent, size, format and spatial reference of a raster file
    pub fn describe<P: AsRef<Path>>(path: P) -> MaResult<DatasetDescription> {
        let path = path.as_ref();
        log::info!("Reading raster properties: {}", path.display());

        let dataset = Dataset::open(path)?;
        let (width, height) = dataset.raster_size();
        let gt = dataset.geo_transform()?;
        log::debug!("Raster size: {}x{}, geotransform: {:?}", width, height, gt);

        // Corners from the geotransform (north-up assumed)
        let x0 = gt[0];
        let y0 = gt[3];
        let x1 = gt[0] + gt[1] * width as f64 + gt[2] * height as f64;
        let y1 = gt[3] + gt[4] * width as f64 + gt[5] * height as f64;
        let extent = Envelope::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));

        let format = dataset.driver().short_name();
        let mut description = DatasetDescription::new(path, DatasetType::RasterDataset)
            .with_extent(extent)
            .with_raster(width, height, &format);

        if let Ok(srs) = dataset.spatial_ref() {
            description = description.with_spatial_reference(spatial_reference_of(&srs));
        }
        Ok(description)
    }
}

fn spatial_reference_of(srs: &SpatialRef) -> SpatialReference {
    let name = srs.name().unwrap_or_else(|_| "Unknown".to_string());
    let kind = if srs.is_geographic() {
        SpatialReferenceKind::Geographic
    } else if srs.is_projected() {
        let linear_unit = srs
            .linear_units_name()
            .unwrap_or_else(|_| "meters".to_string());
        SpatialReferenceKind::Projected { linear_unit }
    } else {
        SpatialReferenceKind::Unknown
    };
    SpatialReference { name, kind }
}
