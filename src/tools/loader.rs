//! Load rasters into an MA raster catalog

use crate::core::catalog::{catalog_product, scale_from_raster, DEFAULT_SERIES};
use crate::core::schema::{missing_fields, FieldValue, Row, PRODUCT_LENGTH, SERIES_LENGTH};
use crate::io::engine::{DatasetDescription, DatasetType, GeoprocessingEngine};
use crate::types::{MaError, MaResult, SpatialReference};
use std::path::{Path, PathBuf};

/// Fields a catalog needs before rasters can be loaded into it
const LOADER_FIELDS: [&str; 4] = ["PRODUCT", "SERIES", "SCALE", "FULL_NAME"];

/// Catalog attributes applied to every loaded raster; `None` derives a value per raster
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Product name; defaults to the raster's format
    pub product: Option<String>,
    /// Map scale; defaults to an estimate from the raster's pixel density
    pub scale: Option<i64>,
    /// Series; defaults to "MISC"
    pub series: Option<String>,
}

impl LoadOptions {
    /// Read optional tool parameters where "#" or an empty string means "derive"
    pub fn from_params(product: &str, scale: &str, series: &str) -> MaResult<Self> {
        let given = |s: &str| {
            let s = s.trim();
            (!s.is_empty() && s != "#").then(|| s.to_string())
        };
        let scale = match given(scale) {
            Some(text) => Some(text.parse::<i64>().map_err(|_| {
                MaError::InvalidParameter(format!("Scale must be an integer, got '{}'", text))
            })?),
            None => None,
        };
        let options = Self {
            product: given(product),
            scale,
            series: given(series),
        };
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> MaResult<()> {
        let too_long = |value: &Option<String>, max: u32| {
            value.as_ref().map(|v| v.chars().count() > max as usize).unwrap_or(false)
        };
        if too_long(&self.product, PRODUCT_LENGTH) {
            return Err(MaError::InvalidParameter(format!(
                "Product exceeds {} characters",
                PRODUCT_LENGTH
            )));
        }
        if too_long(&self.series, SERIES_LENGTH) {
            return Err(MaError::InvalidParameter(format!(
                "Series exceeds {} characters",
                SERIES_LENGTH
            )));
        }
        if matches!(self.scale, Some(s) if s <= 0) {
            return Err(MaError::InvalidParameter(
                "Scale must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a bulk load: rasters that made it and warnings for those that did not
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub loaded: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Split a semicolon-separated list of inputs, stripping quotes and parentheses
pub fn split_multi_inputs(inputs: &str) -> Vec<String> {
    inputs
        .split(';')
        .map(|s| s.replace(['(', ')', '\''], "").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn catalog_row(description: &DatasetDescription, options: &LoadOptions) -> MaResult<Row> {
    if description.dataset_type != DatasetType::RasterDataset {
        return Err(MaError::InvalidParameter(format!(
            "{} is not a raster dataset",
            description.path.display()
        )));
    }

    let series = options.series.as_deref().unwrap_or(DEFAULT_SERIES);
    let product = match &options.product {
        Some(product) => product.clone(),
        None => description.format.clone().unwrap_or_default(),
    };
    let scale = match options.scale {
        Some(scale) => scale,
        None => {
            let extent = description.extent.ok_or_else(|| {
                MaError::ExtentMismatch(format!("{} has no extent", description.path.display()))
            })?;
            let geographic = description
                .spatial_reference
                .as_ref()
                .map(SpatialReference::is_geographic)
                .unwrap_or(false);
            scale_from_raster(description.width.unwrap_or(0), &extent, geographic)
        }
    };

    let mut row = Row::new();
    row.set("FULL_NAME", FieldValue::Text(description.path.display().to_string()));
    row.set("PRODUCT", FieldValue::Text(catalog_product(series, &product)));
    row.set("SERIES", FieldValue::Text(series.to_string()));
    row.set("SCALE", FieldValue::Long(scale));
    Ok(row)
}

/// Add each raster to `catalog` with PRODUCT, SERIES, SCALE and FULL_NAME set.
///
/// A raster that cannot be described or inserted becomes a warning in the
/// report and the remaining rasters are still loaded. The call itself fails
/// only when the catalog is unusable.
pub fn load_rasters<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    catalog: &Path,
    rasters: &[PathBuf],
    options: &LoadOptions,
) -> MaResult<LoadReport> {
    options.validate()?;
    if !engine.exists(catalog) {
        return Err(MaError::DatasetNotFound(catalog.display().to_string()));
    }
    let missing = missing_fields(&engine.list_fields(catalog)?, &LOADER_FIELDS);
    if !missing.is_empty() {
        return Err(MaError::MissingFields {
            dataset: catalog.display().to_string(),
            fields: missing,
        });
    }

    let mut report = LoadReport::default();
    for raster in rasters {
        log::info!("Processing raster {}", raster.display());
        let loaded = engine
            .describe(raster)
            .and_then(|description| catalog_row(&description, options))
            .and_then(|row| engine.insert_row(catalog, row));
        match loaded {
            Ok(()) => report.loaded.push(raster.clone()),
            Err(e) => {
                let warning = format!("Failed to set dataset properties. {}: {}", raster.display(), e);
                log::warn!("{}", warning);
                report.warnings.push(warning);
            }
        }
    }

    log::info!(
        "Loaded {} of {} rasters into {}",
        report.loaded.len(),
        rasters.len(),
        catalog.display()
    );
    Ok(report)
}
