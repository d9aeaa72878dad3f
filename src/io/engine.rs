//! Geoprocessing engine seam and an in-memory engine

use crate::core::catalog::ManagementType;
use crate::core::schema::{FieldDef, Row};
use crate::io::workspace::DatabaseParams;
use crate::types::{Envelope, GeometryType, MaError, MaResult, SpatialReference};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// What kind of dataset a path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetType {
    Table,
    FeatureClass(GeometryType),
    RasterCatalog,
    RasterDataset,
}

/// Properties of a dataset as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescription {
    pub path: PathBuf,
    pub dataset_type: DatasetType,
    pub spatial_reference: Option<SpatialReference>,
    pub extent: Option<Envelope>,
    /// Raster columns
    pub width: Option<usize>,
    /// Raster rows
    pub height: Option<usize>,
    /// Raster format name (e.g. "TIFF", "RPF")
    pub format: Option<String>,
}

impl DatasetDescription {
    pub fn new<P: Into<PathBuf>>(path: P, dataset_type: DatasetType) -> Self {
        Self {
            path: path.into(),
            dataset_type,
            spatial_reference: None,
            extent: None,
            width: None,
            height: None,
            format: None,
        }
    }

    pub fn with_spatial_reference(mut self, sr: SpatialReference) -> Self {
        self.spatial_reference = Some(sr);
        self
    }

    pub fn with_extent(mut self, extent: Envelope) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Raster size and format
    pub fn with_raster(mut self, width: usize, height: usize, format: &str) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self.format = Some(format.to_string());
        self
    }

    pub fn is_point_feature_class(&self) -> bool {
        matches!(
            self.dataset_type,
            DatasetType::FeatureClass(GeometryType::Point)
                | DatasetType::FeatureClass(GeometryType::Multipoint)
        )
    }
}

/// Operations the tools need from a geoprocessing engine.
///
/// Failed calls leave a description in the engine's message buffer as well
/// as returning an error.
pub trait GeoprocessingEngine {
    fn exists(&self, path: &Path) -> bool;

    fn describe(&self, path: &Path) -> MaResult<DatasetDescription>;

    fn list_fields(&self, path: &Path) -> MaResult<Vec<String>>;

    fn create_table(&mut self, workspace: &Path, name: &str) -> MaResult<PathBuf>;

    fn create_feature_class(
        &mut self,
        workspace: &Path,
        name: &str,
        geometry: GeometryType,
        sr: &SpatialReference,
    ) -> MaResult<PathBuf>;

    fn create_raster_catalog(
        &mut self,
        workspace: &Path,
        name: &str,
        sr: &SpatialReference,
        management: ManagementType,
        params: &DatabaseParams,
    ) -> MaResult<PathBuf>;

    fn add_field(&mut self, dataset: &Path, field: &FieldDef) -> MaResult<()>;

    fn delete(&mut self, path: &Path) -> MaResult<()>;

    fn insert_row(&mut self, dataset: &Path, row: Row) -> MaResult<()>;

    fn rows(&self, dataset: &Path) -> MaResult<Vec<Row>>;

    /// Apply `update` to every row of a dataset, returning the number of rows
    fn update_rows(&mut self, dataset: &Path, update: &mut dyn FnMut(&mut Row)) -> MaResult<usize>;

    /// Messages accumulated since the engine was created
    fn messages(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct MemoryDataset {
    description: DatasetDescription,
    fields: Vec<FieldDef>,
    rows: Vec<Row>,
}

/// Engine that keeps datasets in memory, keyed by path
#[derive(Debug, Default)]
pub struct MemoryEngine {
    datasets: BTreeMap<PathBuf, MemoryDataset>,
    failing_fields: HashSet<String>,
    messages: Vec<String>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing dataset, e.g. a raster to load
    pub fn add_dataset(&mut self, description: DatasetDescription) {
        self.datasets.insert(
            description.path.clone(),
            MemoryDataset {
                description,
                fields: Vec::new(),
                rows: Vec::new(),
            },
        );
    }

    /// Make every later `add_field` of this field name fail
    pub fn fail_field(&mut self, name: &str) {
        self.failing_fields.insert(name.to_ascii_uppercase());
    }

    pub fn dataset_paths(&self) -> Vec<PathBuf> {
        self.datasets.keys().cloned().collect()
    }

    pub fn fields(&self, path: &Path) -> MaResult<&[FieldDef]> {
        Ok(&self.dataset(path)?.fields)
    }

    fn fail<T>(&mut self, error: MaError) -> MaResult<T> {
        self.messages.push(format!("ERROR: {}", error));
        Err(error)
    }

    fn dataset(&self, path: &Path) -> MaResult<&MemoryDataset> {
        self.datasets
            .get(path)
            .ok_or_else(|| MaError::DatasetNotFound(path.display().to_string()))
    }

    fn create(&mut self, description: DatasetDescription) -> MaResult<PathBuf> {
        let path = description.path.clone();
        if self.datasets.contains_key(&path) {
            return self.fail(MaError::AlreadyExists(path.display().to_string()));
        }
        self.messages.push(format!("Created {}", path.display()));
        self.add_dataset(description);
        Ok(path)
    }
}

impl GeoprocessingEngine for MemoryEngine {
    fn exists(&self, path: &Path) -> bool {
        self.datasets.contains_key(path)
    }

    fn describe(&self, path: &Path) -> MaResult<DatasetDescription> {
        Ok(self.dataset(path)?.description.clone())
    }

    fn list_fields(&self, path: &Path) -> MaResult<Vec<String>> {
        Ok(self
            .dataset(path)?
            .fields
            .iter()
            .map(|f| f.name.clone())
            .collect())
    }

    fn create_table(&mut self, workspace: &Path, name: &str) -> MaResult<PathBuf> {
        self.create(DatasetDescription::new(workspace.join(name), DatasetType::Table))
    }

    fn create_feature_class(
        &mut self,
        workspace: &Path,
        name: &str,
        geometry: GeometryType,
        sr: &SpatialReference,
    ) -> MaResult<PathBuf> {
        self.create(
            DatasetDescription::new(workspace.join(name), DatasetType::FeatureClass(geometry))
                .with_spatial_reference(sr.clone()),
        )
    }

    fn create_raster_catalog(
        &mut self,
        workspace: &Path,
        name: &str,
        sr: &SpatialReference,
        management: ManagementType,
        params: &DatabaseParams,
    ) -> MaResult<PathBuf> {
        log::debug!(
            "Memory raster catalog {} ({:?}, keyword '{}')",
            name,
            management,
            params.config_keyword
        );
        self.create(
            DatasetDescription::new(workspace.join(name), DatasetType::RasterCatalog)
                .with_spatial_reference(sr.clone()),
        )
    }

    fn add_field(&mut self, dataset: &Path, field: &FieldDef) -> MaResult<()> {
        if self.failing_fields.contains(&field.name.to_ascii_uppercase()) {
            return self.fail(MaError::Engine(format!(
                "Failed to add field {} to {}",
                field.name,
                dataset.display()
            )));
        }
        let Some(target) = self.datasets.get_mut(dataset) else {
            return self.fail(MaError::DatasetNotFound(dataset.display().to_string()));
        };
        if target
            .fields
            .iter()
            .any(|f| f.name.eq_ignore_ascii_case(&field.name))
        {
            return self.fail(MaError::AlreadyExists(format!(
                "{}.{}",
                dataset.display(),
                field.name
            )));
        }
        target.fields.push(field.clone());
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> MaResult<()> {
        match self.datasets.remove(path) {
            Some(_) => {
                self.messages.push(format!("Deleted {}", path.display()));
                Ok(())
            }
            None => self.fail(MaError::DatasetNotFound(path.display().to_string())),
        }
    }

    fn insert_row(&mut self, dataset: &Path, row: Row) -> MaResult<()> {
        let Some(target) = self.datasets.get_mut(dataset) else {
            return self.fail(MaError::DatasetNotFound(dataset.display().to_string()));
        };
        let unknown: Vec<String> = row
            .values
            .keys()
            .filter(|name| !target.fields.iter().any(|f| f.name.eq_ignore_ascii_case(name)))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return self.fail(MaError::Engine(format!(
                "Fields {:?} do not exist in {}",
                unknown,
                dataset.display()
            )));
        }
        target.rows.push(row);
        Ok(())
    }

    fn rows(&self, dataset: &Path) -> MaResult<Vec<Row>> {
        Ok(self.dataset(dataset)?.rows.clone())
    }

    fn update_rows(&mut self, dataset: &Path, update: &mut dyn FnMut(&mut Row)) -> MaResult<usize> {
        let Some(target) = self.datasets.get_mut(dataset) else {
            return self.fail(MaError::DatasetNotFound(dataset.display().to_string()));
        };
        target.rows.iter_mut().for_each(|row| update(row));
        Ok(target.rows.len())
    }

    fn messages(&self) -> Vec<String> {
        self.messages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::FieldValue;

    #[test]
    fn test_create_and_describe() {
        let mut engine = MemoryEngine::new();
        let ws = Path::new("/data/a.gdb");
        let sr = SpatialReference::geographic_wgs84();
        let fc = engine
            .create_feature_class(ws, "obs", GeometryType::Point, &sr)
            .unwrap();

        assert!(engine.exists(&fc));
        let desc = engine.describe(&fc).unwrap();
        assert!(desc.is_point_feature_class());
        assert_eq!(desc.spatial_reference, Some(sr.clone()));

        let again = engine.create_feature_class(ws, "obs", GeometryType::Point, &sr);
        assert!(matches!(again, Err(MaError::AlreadyExists(_))));
        assert!(engine.messages().last().unwrap().starts_with("ERROR"));
    }

    #[test]
    fn test_fields_and_rows() {
        let mut engine = MemoryEngine::new();
        let table = engine.create_table(Path::new("/ws"), "t").unwrap();
        engine.add_field(&table, &FieldDef::long("SCALE")).unwrap();
        assert!(engine.add_field(&table, &FieldDef::long("scale")).is_err());

        let mut row = Row::new();
        row.set("SCALE", FieldValue::Long(5));
        engine.insert_row(&table, row).unwrap();

        let mut bad = Row::new();
        bad.set("MISSING", FieldValue::Null);
        assert!(engine.insert_row(&table, bad).is_err());

        let updated = engine
            .update_rows(&table, &mut |row: &mut Row| row.set("SCALE", FieldValue::Long(7)))
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(
            engine.rows(&table).unwrap()[0].get("SCALE"),
            Some(&FieldValue::Long(7))
        );

        engine.delete(&table).unwrap();
        assert!(!engine.exists(&table));
        assert!(engine.list_fields(&table).is_err());
    }

    #[test]
    fn test_failing_field() {
        let mut engine = MemoryEngine::new();
        let table = engine.create_table(Path::new("/ws"), "t").unwrap();
        engine.fail_field("Product");
        assert!(matches!(
            engine.add_field(&table, &FieldDef::text("PRODUCT", 25)),
            Err(MaError::Engine(_))
        ));
    }
}
