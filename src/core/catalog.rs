//! Raster catalog helpers: catalog kinds, product listings and scale estimation

use crate::core::schema::{
    dted_catalog_fields, rpf_catalog_fields, rpf_uid_table_fields, rpf_uid_table_name,
    vpf_feature_fields, vpf_table_fields, vpf_table_name, FieldDef, FieldValue, Row,
};
use crate::types::{Envelope, MaError, MaResult, WorkspaceKind};

/// Scale used when a raster's scale cannot be estimated
pub const DEFAULT_SCALE: i64 = 50001;
/// Smallest plausible scale (a 100 m image)
pub const MIN_SCALE: i64 = 100;
/// Largest plausible scale (the circumference of the earth in meters)
pub const MAX_SCALE: i64 = 40_000_000;
/// Meters per decimal degree used for scale estimation
const SCALE_METERS_PER_DEGREE: f64 = 111_120.0;

/// Series stored when the caller does not supply one
pub const DEFAULT_SERIES: &str = "MISC";

/// The three catalog schemas the toolbox creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// Digital Terrain Elevation Data raster catalog
    Dted,
    /// Raster Product Format raster catalog with a uid companion table
    Rpf,
    /// Vector Product Format tile index and coverage table
    Vpf,
}

impl CatalogKind {
    /// Fields added to the primary catalog dataset
    pub fn fields(&self) -> Vec<FieldDef> {
        match self {
            CatalogKind::Dted => dted_catalog_fields(),
            CatalogKind::Rpf => rpf_catalog_fields(),
            CatalogKind::Vpf => vpf_feature_fields(),
        }
    }

    /// Companion table created next to the catalog, as (name, fields)
    pub fn companion_table(&self, catalog_name: &str) -> Option<(String, Vec<FieldDef>)> {
        match self {
            CatalogKind::Dted => None,
            CatalogKind::Rpf => Some((rpf_uid_table_name(catalog_name), rpf_uid_table_fields())),
            CatalogKind::Vpf => Some((vpf_table_name(catalog_name), vpf_table_fields())),
        }
    }

    /// Whether the primary dataset is a raster catalog (VPF uses a polygon feature class)
    pub fn is_raster_catalog(&self) -> bool {
        !matches!(self, CatalogKind::Vpf)
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Dted => write!(f, "DTED"),
            CatalogKind::Rpf => write!(f, "RPF"),
            CatalogKind::Vpf => write!(f, "VPF"),
        }
    }
}

impl std::str::FromStr for CatalogKind {
    type Err = MaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DTED" => Ok(CatalogKind::Dted),
            "RPF" => Ok(CatalogKind::Rpf),
            "VPF" => Ok(CatalogKind::Vpf),
            _ => Err(MaError::InvalidParameter(format!("Unknown catalog type: {}", s))),
        }
    }
}

/// Raster storage management of a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementType {
    Managed,
    Unmanaged,
}

impl ManagementType {
    /// File and personal geodatabases hold unmanaged catalogs; everything else is managed
    pub fn for_workspace(kind: WorkspaceKind) -> Self {
        match kind {
            WorkspaceKind::LocalDatabase => ManagementType::Unmanaged,
            _ => ManagementType::Managed,
        }
    }
}

/// Unique DTED_TYPE values of a DTED catalog, in first-seen order
pub fn dted_types(catalog: &str, rows: &[Row]) -> MaResult<Vec<String>> {
    let mut types: Vec<String> = Vec::new();
    for value in rows.iter().filter_map(|row| row.get("DTED_TYPE")) {
        if let Some(dted_type) = value.as_text() {
            if !types.contains(&dted_type) {
                types.push(dted_type);
            }
        }
    }

    if types.is_empty() {
        return Err(MaError::Catalog(format!(
            "Catalog {} does not contain DTED_TYPE information.",
            catalog
        )));
    }
    Ok(types)
}

/// Unique RPF products of a catalog as `product\type\series`.
///
/// PRODUCT values are stored as `product$type`; a value without `$` is
/// treated as a product with an empty type.
pub fn rpf_products(rows: &[Row]) -> Vec<String> {
    let mut products: Vec<String> = Vec::new();
    for row in rows {
        let Some(stored) = row.get("PRODUCT").and_then(FieldValue::as_text) else {
            continue;
        };
        let series = row
            .get("SERIES")
            .and_then(FieldValue::as_text)
            .unwrap_or_default();
        let (product, product_type) = stored.split_once('$').unwrap_or((stored.as_str(), ""));
        let listing = format!("{}\\{}\\{}", product, product_type, series);
        if !products.contains(&listing) {
            products.push(listing);
        }
    }
    products
}

/// Value stored in the PRODUCT field of a loaded raster
pub fn catalog_product(series: &str, product: &str) -> String {
    format!("{}${}", series, product)
}

/// Estimate the map scale of a geographic raster from its pixel density.
///
/// Meters per pixel is `111120 / (width_px / extent_width)`. The scale is that
/// times 5000, or the rounded meters per pixel itself below 5 m.
pub fn try_scale_from_raster(width_px: usize, extent: &Envelope, geographic: bool) -> MaResult<i64> {
    if !geographic {
        return Err(MaError::InvalidParameter(
            "Raster spatial reference is not geographic".to_string(),
        ));
    }

    let width_degrees = extent.width().abs();
    if width_px == 0 || width_degrees == 0.0 || !width_degrees.is_finite() {
        return Err(MaError::InvalidParameter(format!(
            "Cannot compute pixel density for {} pixels over {} degrees",
            width_px, width_degrees
        )));
    }

    let pixels_per_degree = width_px as f64 / width_degrees;
    let meters_per_pixel = SCALE_METERS_PER_DEGREE / pixels_per_degree;
    let scale = if meters_per_pixel < 5.0 {
        meters_per_pixel.round()
    } else {
        (meters_per_pixel * 5000.0).round()
    } as i64;

    log::debug!(
        "Pixels per degree {}, meters per pixel {}, scale {}",
        pixels_per_degree,
        meters_per_pixel,
        scale
    );

    if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
        return Err(MaError::InvalidParameter(format!(
            "The calculated scale {} is out of bounds",
            scale
        )));
    }
    Ok(scale)
}

/// Like [`try_scale_from_raster`], falling back to [`DEFAULT_SCALE`] with a warning
pub fn scale_from_raster(width_px: usize, extent: &Envelope, geographic: bool) -> i64 {
    match try_scale_from_raster(width_px, extent, geographic) {
        Ok(scale) => scale,
        Err(e) => {
            log::warn!(
                "Could not auto-calculate scale, using default={}: {}",
                DEFAULT_SCALE,
                e
            );
            DEFAULT_SCALE
        }
    }
}
