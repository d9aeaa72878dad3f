//! Tool procedures run against a geoprocessing engine

pub mod catalog;
pub mod extent;
pub mod loader;
pub mod observers;

pub use catalog::{create_catalog, create_dted_catalog, create_rpf_catalog, create_vpf_catalog};
pub use extent::{check_context_extent, check_extents, dataset_z_factor, observer_analysis_extent};
pub use loader::{load_rasters, split_multi_inputs, LoadOptions, LoadReport};
pub use observers::{
    add_observer, add_observer_fields, create_observers_from_table, create_single_observer,
};
