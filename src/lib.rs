//! matools: Military Analyst toolbox utilities
//!
//! Envelope relation classification, unit conversion, scratch workspace
//! naming and the catalog/observer schemas used by the MA geoprocessing
//! tools, with the tools themselves written against a
//! [`GeoprocessingEngine`](io::GeoprocessingEngine).

pub mod types;
pub mod io;
pub mod core;
pub mod tools;

// Re-export main types and functions for easier access
pub use types::{
    Envelope, GeometryType, MaError, MaResult, Point, ResourceKind, SpatialReference,
    SpatialReferenceKind, WorkspaceKind,
};

pub use self::core::{
    convert_angular_units, convert_area_units, convert_linear_units, envelope_relation,
    observer_extent, z_factor, Observer, Relation,
};
pub use io::{
    generate_temp_name, generate_unique_name, GeoprocessingEngine, MaOptions, MemoryEngine,
    TempWorkspace, ToolContext,
};

#[cfg(feature = "python")]
mod python {
    use crate::types::{Envelope, MaError, ResourceKind};
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;

    fn to_py_err(e: MaError) -> PyErr {
        match e {
            MaError::Io(_) | MaError::Engine(_) => PyErr::new::<PyRuntimeError, _>(e.to_string()),
            _ => PyErr::new::<PyValueError, _>(e.to_string()),
        }
    }

    fn envelope_from(coords: Vec<f64>) -> PyResult<Envelope> {
        Envelope::from_slice(&coords).map_err(to_py_err)
    }

    /// Relation code of envelope A against envelope B, each given as [left, bottom, right, top]
    #[pyfunction]
    fn envelope_relation(a: Vec<f64>, b: Vec<f64>) -> PyResult<i32> {
        let a = envelope_from(a)?;
        let b = envelope_from(b)?;
        Ok(crate::core::envelope_relation(&a, &b).code())
    }

    #[pyfunction]
    fn convert_linear_units(value: f64, from_unit: &str, to_unit: &str) -> PyResult<f64> {
        crate::core::convert_linear_units(value, from_unit, to_unit).map_err(to_py_err)
    }

    #[pyfunction]
    fn convert_angular_units(value: f64, from_unit: &str, to_unit: &str) -> PyResult<f64> {
        crate::core::convert_angular_units(value, from_unit, to_unit).map_err(to_py_err)
    }

    #[pyfunction]
    fn convert_area_units(value: f64, from_unit: &str, to_unit: &str) -> PyResult<f64> {
        crate::core::convert_area_units(value, from_unit, to_unit).map_err(to_py_err)
    }

    /// Name that does not yet exist in the workspace directory
    #[pyfunction]
    fn generate_unique_name(name: &str, workspace: &str) -> String {
        crate::io::generate_unique_name(name, workspace)
    }

    /// Scratch path for a resource kind ("RasterDataset", "FeatureClass", ...)
    #[pyfunction]
    fn generate_temp_name(workspace: &str, kind: &str) -> PyResult<String> {
        let kind: ResourceKind = kind.parse().map_err(to_py_err)?;
        crate::io::generate_temp_name(workspace, kind)
            .map(|p| p.display().to_string())
            .map_err(to_py_err)
    }

    #[pyfunction]
    fn z_factor(mid_latitude: f64) -> PyResult<f64> {
        crate::core::z_factor(mid_latitude).map_err(to_py_err)
    }

    /// Python module definition
    #[pymodule]
    fn matools(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(envelope_relation, m)?)?;
        m.add_function(wrap_pyfunction!(convert_linear_units, m)?)?;
        m.add_function(wrap_pyfunction!(convert_angular_units, m)?)?;
        m.add_function(wrap_pyfunction!(convert_area_units, m)?)?;
        m.add_function(wrap_pyfunction!(generate_unique_name, m)?)?;
        m.add_function(wrap_pyfunction!(generate_temp_name, m)?)?;
        m.add_function(wrap_pyfunction!(z_factor, m)?)?;
        Ok(())
    }
}
