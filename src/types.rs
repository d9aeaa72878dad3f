use serde::{Deserialize, Serialize};
use std::path::Path;

/// Axis-aligned bounding rectangle in a shared planar coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub left: f64,   // xmin
    pub bottom: f64, // ymin
    pub right: f64,  // xmax
    pub top: f64,    // ymax
}

impl Envelope {
    /// Create an envelope without checking edge ordering
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self { left, bottom, right, top }
    }

    /// Create an envelope, rejecting non-finite or inverted edges
    pub fn try_new(left: f64, bottom: f64, right: f64, top: f64) -> MaResult<Self> {
        if ![left, bottom, right, top].iter().all(|v| v.is_finite()) {
            return Err(MaError::InvalidParameter(format!(
                "Envelope coordinates must be finite: ({}, {}, {}, {})",
                left, bottom, right, top
            )));
        }
        if left > right || bottom > top {
            return Err(MaError::InvalidParameter(format!(
                "Envelope edges are inverted: ({}, {}, {}, {})",
                left, bottom, right, top
            )));
        }
        Ok(Self::new(left, bottom, right, top))
    }

    /// Build from a `[left, bottom, right, top]` slice
    pub fn from_slice(coords: &[f64]) -> MaResult<Self> {
        match coords {
            [l, b, r, t] => Ok(Self::new(*l, *b, *r, *t)),
            _ => Err(MaError::InvalidParameter(
                "Envelope must contain a left, bottom, right and top coordinate.".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.left, self.bottom, self.right, self.top)
    }
}

impl std::str::FromStr for Envelope {
    type Err = MaError;

    /// Parse "left bottom right top", separated by spaces or commas
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<f64>().map_err(|_| {
                    MaError::InvalidParameter(format!("Invalid envelope coordinate: {}", t))
                })
            })
            .collect::<MaResult<Vec<f64>>>()?;
        Self::from_slice(&coords)
    }
}

/// Point geometry with an optional elevation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// Kind of backing store a workspace path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkspaceKind {
    /// Plain directory of flat files (shapefiles, .img rasters)
    FileSystem,
    /// File or personal geodatabase (.gdb, .mdb)
    LocalDatabase,
    /// Enterprise connection (.sde)
    RemoteDatabase,
}

impl WorkspaceKind {
    /// Classify a workspace path by its suffix
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("sde") => WorkspaceKind::RemoteDatabase,
            Some("gdb") | Some("mdb") => WorkspaceKind::LocalDatabase,
            _ => WorkspaceKind::FileSystem,
        }
    }
}

impl std::fmt::Display for WorkspaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceKind::FileSystem => write!(f, "FileSystem"),
            WorkspaceKind::LocalDatabase => write!(f, "LocalDatabase"),
            WorkspaceKind::RemoteDatabase => write!(f, "RemoteDatabase"),
        }
    }
}

/// Kind of scratch resource a temp name is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    RasterDataset,
    /// Raster with NODATA cells; must be stored as a GRID
    NoDataRasterDataset,
    FeatureClass,
    ProjectionFile,
    AsciiFile,
}

impl std::str::FromStr for ResourceKind {
    type Err = MaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "rasterdataset" | "raster" => Ok(ResourceKind::RasterDataset),
            "nodatarasterdataset" | "nodataraster" | "grid" => Ok(ResourceKind::NoDataRasterDataset),
            "featureclass" | "features" => Ok(ResourceKind::FeatureClass),
            "projectionfile" | "prj" => Ok(ResourceKind::ProjectionFile),
            "asciifile" | "ascii" | "txt" => Ok(ResourceKind::AsciiFile),
            _ => Err(MaError::InvalidParameter(format!("Unknown resource kind: {}", s))),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::RasterDataset => "RasterDataset",
            ResourceKind::NoDataRasterDataset => "NoDataRasterDataset",
            ResourceKind::FeatureClass => "FeatureClass",
            ResourceKind::ProjectionFile => "ProjectionFile",
            ResourceKind::AsciiFile => "ASCIIFile",
        };
        write!(f, "{}", name)
    }
}

/// Coordinate system classification of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpatialReferenceKind {
    /// Geographic coordinates (latitude, longitude in degrees)
    Geographic,
    /// Projected coordinates with the name of their linear unit
    Projected { linear_unit: String },
    Unknown,
}

/// Spatial reference as seen by the tools: a name plus its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub name: String,
    pub kind: SpatialReferenceKind,
}

impl SpatialReference {
    pub fn geographic_wgs84() -> Self {
        Self {
            name: "GCS_WGS_1984".to_string(),
            kind: SpatialReferenceKind::Geographic,
        }
    }

    pub fn projected(name: &str, linear_unit: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SpatialReferenceKind::Projected {
                linear_unit: linear_unit.to_string(),
            },
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.kind, SpatialReferenceKind::Geographic)
    }
}

/// Geometry type of a feature class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Multipoint,
    Polyline,
    Polygon,
}

/// Error types for toolbox operations
#[derive(Debug, thiserror::Error)]
pub enum MaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unit {0} could not be understood.")]
    UnknownUnit(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dataset {0} does not exist.")]
    DatasetNotFound(String),

    #[error("Dataset {0} already exists.")]
    AlreadyExists(String),

    #[error("Dataset {0} is not a point or multipoint feature class.")]
    WrongGeometry(String),

    #[error("Dataset {dataset} is missing the following required fields: {fields:?}")]
    MissingFields { dataset: String, fields: Vec<String> },

    #[error("Extent mismatch: {0}")]
    ExtentMismatch(String),

    #[error("Spatial reference {found} does not match {expected}")]
    SpatialReferenceMismatch { expected: String, found: String },

    #[error("Cannot properly convert distance units because coordinate system is Unknown")]
    UnknownCoordinateSystem,

    #[error("Cannot create a {kind} in a {workspace} workspace")]
    UnsupportedResource { kind: ResourceKind, workspace: WorkspaceKind },

    #[error("Geoprocessing engine error: {0}")]
    Engine(String),

    #[error("Options error: {0}")]
    Options(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for toolbox operations
pub type MaResult<T> = Result<T, MaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_kind_detection() {
        assert_eq!(WorkspaceKind::detect("/data/conn.sde"), WorkspaceKind::RemoteDatabase);
        assert_eq!(WorkspaceKind::detect("/data/terrain.GDB"), WorkspaceKind::LocalDatabase);
        assert_eq!(WorkspaceKind::detect("/data/old.mdb"), WorkspaceKind::LocalDatabase);
        assert_eq!(WorkspaceKind::detect("/data/shapes"), WorkspaceKind::FileSystem);
    }

    #[test]
    fn test_envelope_parsing() {
        let env: Envelope = "0, 0, 10.5 10".parse().unwrap();
        assert_eq!(env, Envelope::new(0.0, 0.0, 10.5, 10.0));

        assert!("1 2 3".parse::<Envelope>().is_err());
        assert!("1 2 x 4".parse::<Envelope>().is_err());
    }

    #[test]
    fn test_envelope_validation() {
        assert!(Envelope::try_new(0.0, 0.0, 1.0, 1.0).is_ok());
        assert!(Envelope::try_new(2.0, 0.0, 1.0, 1.0).is_err());
        assert!(Envelope::try_new(0.0, f64::NAN, 1.0, 1.0).is_err());
    }
}
