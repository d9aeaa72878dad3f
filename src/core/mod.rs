//! Core toolbox logic: geometry relations, units, schemas and observers

pub mod catalog;
pub mod envelope;
pub mod observer;
pub mod schema;
pub mod units;

// Re-export main types
pub use catalog::{dted_types, rpf_products, scale_from_raster, CatalogKind, ManagementType};
pub use envelope::{check_extent, envelope_relation, z_factor, ExtentPolicy, Relation};
pub use observer::{observer_extent, Observer, ObserverParams};
pub use schema::{FieldDef, FieldType, FieldValue, Row};
pub use units::{
    convert_angular_units, convert_area_units, convert_linear_units, AngularUnit, AreaUnit,
    LinearUnit,
};
