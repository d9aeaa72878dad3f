//! Create DTED, RPF and VPF catalog schemas

use crate::core::catalog::{CatalogKind, ManagementType};
use crate::core::schema::FieldDef;
use crate::io::engine::GeoprocessingEngine;
use crate::io::options::ToolContext;
use crate::io::workspace::DatabaseParams;
use crate::types::{GeometryType, MaError, MaResult, SpatialReference, WorkspaceKind};
use std::path::{Path, PathBuf};

fn add_fields<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    dataset: &Path,
    fields: &[FieldDef],
) -> MaResult<()> {
    for field in fields {
        log::debug!("Adding {} to {}", field, dataset.display());
        engine.add_field(dataset, field)?;
    }
    Ok(())
}

/// Delete datasets created by a failed run; failures here are only logged
fn rollback<E: GeoprocessingEngine + ?Sized>(engine: &mut E, created: &[PathBuf]) {
    for path in created.iter().rev() {
        match engine.delete(path) {
            Ok(()) => log::info!("Removed {}", path.display()),
            Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
        }
    }
}

/// Create the catalog dataset of `kind` named `name` in `workspace`.
///
/// The primary dataset and any companion table are removed again when a
/// later step fails, so a failed run leaves nothing behind.
pub fn create_catalog<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    ctx: &ToolContext,
    workspace: &Path,
    name: &str,
    kind: CatalogKind,
) -> MaResult<PathBuf> {
    let catalog_path = workspace.join(name);
    if engine.exists(&catalog_path) {
        return Err(MaError::AlreadyExists(catalog_path.display().to_string()));
    }

    let workspace_kind = WorkspaceKind::detect(workspace);
    let management = ManagementType::for_workspace(workspace_kind);
    let params = DatabaseParams::for_workspace(workspace, ctx.config_keyword.as_deref());
    let sr = SpatialReference::geographic_wgs84();
    log::info!(
        "Creating {} catalog {} ({:?} in {} workspace)",
        kind,
        catalog_path.display(),
        management,
        workspace_kind
    );

    let result = if kind.is_raster_catalog() {
        engine.create_raster_catalog(workspace, name, &sr, management, &params)
    } else {
        engine.create_feature_class(workspace, name, GeometryType::Polygon, &sr)
    };
    let catalog =
        result.map_err(|e| MaError::Catalog(format!("Could not create catalog: {}", e)))?;

    let mut created = vec![catalog.clone()];
    if let Err(e) = add_fields(engine, &catalog, &kind.fields()) {
        rollback(engine, &created);
        return Err(MaError::Catalog(format!(
            "Could not add required fields to catalog: {}",
            e
        )));
    }

    if let Some((table_name, table_fields)) = kind.companion_table(name) {
        let table = match engine.create_table(workspace, &table_name) {
            Ok(table) => table,
            Err(e) => {
                rollback(engine, &created);
                return Err(MaError::Catalog(format!(
                    "Could not create table {}: {}",
                    table_name, e
                )));
            }
        };
        created.push(table.clone());
        if let Err(e) = add_fields(engine, &table, &table_fields) {
            rollback(engine, &created);
            return Err(MaError::Catalog(format!(
                "Could not add required fields to {}: {}",
                table_name, e
            )));
        }
        log::info!("Created companion table {}", table.display());
    }

    log::info!("Catalog created successfully.");
    Ok(catalog)
}

pub fn create_dted_catalog<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    ctx: &ToolContext,
    workspace: &Path,
    name: &str,
) -> MaResult<PathBuf> {
    create_catalog(engine, ctx, workspace, name, CatalogKind::Dted)
}

pub fn create_rpf_catalog<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    ctx: &ToolContext,
    workspace: &Path,
    name: &str,
) -> MaResult<PathBuf> {
    create_catalog(engine, ctx, workspace, name, CatalogKind::Rpf)
}

pub fn create_vpf_catalog<E: GeoprocessingEngine + ?Sized>(
    engine: &mut E,
    ctx: &ToolContext,
    workspace: &Path,
    name: &str,
) -> MaResult<PathBuf> {
    create_catalog(engine, ctx, workspace, name, CatalogKind::Vpf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::engine::{DatasetType, MemoryEngine};

    #[test]
    fn test_create_dted_catalog() {
        let mut engine = MemoryEngine::new();
        let ctx = ToolContext::new("/data");
        let ws = Path::new("/data/terrain.gdb");

        let catalog = create_dted_catalog(&mut engine, &ctx, ws, "dted").unwrap();
        assert_eq!(
            engine.list_fields(&catalog).unwrap(),
            vec!["FULL_NAME", "DTED_TYPE"]
        );
        assert_eq!(
            engine.describe(&catalog).unwrap().dataset_type,
            DatasetType::RasterCatalog
        );

        let again = create_dted_catalog(&mut engine, &ctx, ws, "dted");
        assert!(matches!(again, Err(MaError::AlreadyExists(_))));
    }

    #[test]
    fn test_rpf_catalog_has_uid_table() {
        let mut engine = MemoryEngine::new();
        let ctx = ToolContext::new("/data");
        let ws = Path::new("/data/maps.gdb");

        create_rpf_catalog(&mut engine, &ctx, ws, "cadrg").unwrap();
        let uids = ws.join("cadrg_uids");
        assert_eq!(engine.list_fields(&uids).unwrap(), vec!["PRODUCT", "SCALE"]);
    }

    #[test]
    fn test_field_failure_rolls_back() {
        let mut engine = MemoryEngine::new();
        engine.fail_field("DTED_TYPE");
        let ctx = ToolContext::new("/data");
        let ws = Path::new("/data/terrain.gdb");

        let result = create_dted_catalog(&mut engine, &ctx, ws, "dted");
        assert!(matches!(result, Err(MaError::Catalog(_))));
        assert!(!engine.exists(&ws.join("dted")));
    }

    #[test]
    fn test_companion_failure_rolls_back_both() {
        let mut engine = MemoryEngine::new();
        engine.fail_field("FAC_CODES");
        let ctx = ToolContext::new("/data");
        let ws = Path::new("/data/vmap.gdb");

        assert!(create_vpf_catalog(&mut engine, &ctx, ws, "vmap").is_err());
        assert!(engine.dataset_paths().is_empty());
    }
}
