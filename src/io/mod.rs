//! Workspaces, options and the geoprocessing engine seam

pub mod engine;
pub mod options;
#[cfg(feature = "gdal")]
pub mod raster;
pub mod workspace;

pub use engine::{DatasetDescription, DatasetType, GeoprocessingEngine, MemoryEngine};
pub use options::{GeneralOptions, MaOptions, ToolContext};
#[cfg(feature = "gdal")]
pub use raster::RasterReader;
pub use workspace::{
    generate_temp_name, generate_unique_name, DatabaseParams, ScratchFile, TempWorkspace,
};
