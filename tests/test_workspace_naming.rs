use matools::io::{GeneralOptions, ScratchFile};
use matools::{generate_temp_name, generate_unique_name, MaOptions, ResourceKind, TempWorkspace, ToolContext};
use chrono::{Duration, Utc};
use std::fs;
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn context_in(dir: &std::path::Path) -> ToolContext {
    let options = MaOptions {
        general: GeneralOptions {
            workspace_path_name: Some(dir.display().to_string()),
            distance_units: None,
        },
    };
    ToolContext::new(dir).with_options(options)
}

#[test]
fn test_unique_names_on_disk() {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp directory");

    assert_eq!(generate_unique_name("roads.shp", dir.path()), "roads.shp");
    fs::write(dir.path().join("roads.shp"), b"").unwrap();
    assert_eq!(generate_unique_name("roads.shp", dir.path()), "roads_1.shp");
    fs::write(dir.path().join("roads_1.shp"), b"").unwrap();
    assert_eq!(generate_unique_name("roads.shp", dir.path()), "roads_2.shp");

    fs::create_dir(dir.path().join("viewshed")).unwrap();
    assert_eq!(generate_unique_name("viewshed", dir.path()), "viewshed_1");
}

#[test]
fn test_temp_names_follow_workspace_kind() {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp directory");

    let shp = generate_temp_name(dir.path(), ResourceKind::FeatureClass).unwrap();
    assert_eq!(shp.parent().unwrap(), dir.path());
    assert_eq!(shp.extension().unwrap(), "shp");

    let gdb = dir.path().join("scratch.gdb");
    let grid = generate_temp_name(&gdb, ResourceKind::NoDataRasterDataset).unwrap();
    assert_eq!(grid.parent().unwrap(), dir.path());
    assert!(dir.path().join("info").is_dir());

    let raster = generate_temp_name(&gdb, ResourceKind::RasterDataset).unwrap();
    assert_eq!(raster.parent().unwrap(), gdb.as_path());
    assert!(raster.extension().is_none());
}

#[test]
fn test_temp_workspace_removed_when_created() {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp directory");
    let ctx = context_in(dir.path());

    let path = {
        let workspace = TempWorkspace::acquire(&ctx);
        assert!(workspace.created());
        assert!(workspace.path().is_dir());
        let name = workspace.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("matempgdb") && name.ends_with(".gdb"), "{}", name);
        workspace.path().to_path_buf()
    };
    assert!(!path.exists());
    assert!(dir.path().is_dir());
}

#[test]
fn test_temp_workspace_keep() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let ctx = context_in(dir.path());

    let kept = TempWorkspace::acquire(&ctx).keep();
    assert!(kept.is_dir());
}

#[test]
fn test_existing_database_is_not_removed() {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp directory");
    let gdb = dir.path().join("analysis.gdb");
    fs::create_dir(&gdb).unwrap();
    let ctx = context_in(&gdb);

    {
        let workspace = TempWorkspace::acquire(&ctx);
        assert!(!workspace.created());
        assert_eq!(workspace.path(), gdb.as_path());
    }
    assert!(gdb.is_dir());
}

#[test]
fn test_scratch_files_inside_temp_workspace() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let ctx = context_in(dir.path());
    let workspace = TempWorkspace::acquire(&ctx);

    let written = {
        let scratch: ScratchFile = workspace.temp_name(ResourceKind::FeatureClass).unwrap();
        assert_eq!(scratch.path().parent().unwrap(), workspace.path());
        fs::write(scratch.path(), b"features").unwrap();
        scratch.path().to_path_buf()
    };
    assert!(!written.exists());
    assert!(workspace.path().is_dir());
}

#[test]
fn test_occupied_scratch_names_are_never_claimed() {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp directory");
    let ctx = context_in(dir.path());

    // Another run holding every name this process could pick in the next seconds
    let now = Utc::now();
    let mut foreign = Vec::new();
    for offset in 0..3 {
        let stamp = (now + Duration::seconds(offset)).format("%d%H%M%S");
        for sequence in 0..64 {
            let name = format!("matempgdb{}_{}_{}.gdb", stamp, std::process::id(), sequence);
            let path = dir.path().join(name);
            fs::create_dir(&path).unwrap();
            fs::write(path.join("their_data"), b"keep").unwrap();
            foreign.push(path);
        }
    }

    {
        let workspace = TempWorkspace::acquire(&ctx);
        println!("acquired {} created={}", workspace.path().display(), workspace.created());
        if workspace.created() {
            assert!(!foreign.iter().any(|p| p.as_path() == workspace.path()));
        } else {
            assert_eq!(workspace.path(), dir.path());
        }
    }

    for path in &foreign {
        assert!(path.join("their_data").is_file(), "{} was removed", path.display());
    }
}

#[test]
fn test_missing_base_workspace_is_not_created() {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp directory");
    let missing = dir.path().join("not").join("there");
    let ctx = context_in(&missing);

    {
        let workspace = TempWorkspace::acquire(&ctx);
        assert!(!workspace.created());
        assert_eq!(workspace.path(), missing.as_path());
    }
    assert!(!missing.exists());
    assert!(!dir.path().join("not").exists());
}
