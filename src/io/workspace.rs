//! Workspace classification, unique/temp naming and scratch resource guards

use crate::io::options::ToolContext;
use crate::types::{MaError, MaResult, ResourceKind, WorkspaceKind};
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Extensions kept at the end of a name when a numeric suffix is inserted
const SUFFIXED_EXTENSIONS: [&str; 4] = ["shp", "dbf", "img", "tif"];

/// Directory ArcInfo GRIDs need next to them
const INFO_DIR: &str = "info";

/// Names tried before a scratch workspace falls back to its base
const CREATE_ATTEMPTS: usize = 16;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// UTC day/hour/minute/second stamp, then the process id and a per-process counter
fn temp_stamp() -> String {
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}_{}_{}",
        Utc::now().format("%d%H%M%S"),
        std::process::id(),
        sequence
    )
}

/// Make `name` unique with respect to an existence check.
///
/// Appends `_1`, `_2`, ... to the stem, keeping a .shp/.dbf/.img/.tif
/// extension at the end. Only the name is returned, not the full path.
pub fn generate_unique_name_with<F>(name: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !exists(name) {
        return name.to_string();
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if SUFFIXED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            (stem, format!(".{}", ext))
        }
        _ => (name, String::new()),
    };

    let mut i = 1u64;
    loop {
        let candidate = format!("{}_{}{}", stem, i, extension);
        if !exists(&candidate) {
            log::debug!("Unique name for {}: {}", name, candidate);
            return candidate;
        }
        i += 1;
    }
}

/// Make `name` unique within a directory on disk.
///
/// The check and the later creation are not atomic; another process can
/// still claim the name in between.
pub fn generate_unique_name<P: AsRef<Path>>(name: &str, container: P) -> String {
    let container = container.as_ref();
    generate_unique_name_with(name, |candidate| container.join(candidate).exists())
}

fn ensure_info_dir(dir: &Path) -> MaResult<()> {
    let info = dir.join(INFO_DIR);
    if !info.exists() {
        log::debug!("Creating {}", info.display());
        fs::create_dir_all(&info)?;
    }
    Ok(())
}

fn parent_of(container: &Path) -> PathBuf {
    container
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Generate a path for a scratch resource of `kind` in `container`.
///
/// The layout depends on the container's workspace kind. GRID rasters
/// (`NoDataRasterDataset`) also get an `info` directory created beside them.
pub fn generate_temp_name<P: AsRef<Path>>(container: P, kind: ResourceKind) -> MaResult<PathBuf> {
    let container = container.as_ref();
    let workspace = WorkspaceKind::detect(container);
    let name = format!("tmp{}", temp_stamp());

    let path = match (workspace, kind) {
        (WorkspaceKind::FileSystem, ResourceKind::RasterDataset) => {
            container.join(format!("{}.img", name))
        }
        (WorkspaceKind::FileSystem, ResourceKind::NoDataRasterDataset) => {
            ensure_info_dir(container)?;
            container.join(&name)
        }
        (WorkspaceKind::FileSystem, ResourceKind::FeatureClass) => {
            container.join(format!("{}.shp", name))
        }
        (WorkspaceKind::FileSystem, ResourceKind::ProjectionFile) => {
            container.join(format!("{}.prj", name))
        }
        (WorkspaceKind::FileSystem, ResourceKind::AsciiFile) => {
            container.join(format!("{}.txt", name))
        }

        (WorkspaceKind::LocalDatabase, ResourceKind::FeatureClass)
        | (WorkspaceKind::LocalDatabase, ResourceKind::RasterDataset) => container.join(&name),
        (WorkspaceKind::LocalDatabase, ResourceKind::NoDataRasterDataset) => {
            let parent = parent_of(container);
            ensure_info_dir(&parent)?;
            parent.join(&name)
        }
        (WorkspaceKind::LocalDatabase, ResourceKind::ProjectionFile) => {
            parent_of(container).join(format!("{}.prj", name))
        }
        (WorkspaceKind::LocalDatabase, ResourceKind::AsciiFile) => {
            parent_of(container).join(format!("{}.txt", name))
        }

        (WorkspaceKind::RemoteDatabase, ResourceKind::FeatureClass)
        | (WorkspaceKind::RemoteDatabase, ResourceKind::RasterDataset) => container.join(&name),
        (WorkspaceKind::RemoteDatabase, ResourceKind::ProjectionFile) => {
            std::env::temp_dir().join(format!("{}.prj", name))
        }
        (WorkspaceKind::RemoteDatabase, kind) => {
            return Err(MaError::UnsupportedResource { kind, workspace });
        }
    };

    log::debug!("Temp {} in {} workspace: {}", kind, workspace, path.display());
    Ok(path)
}

/// Environment settings a geodatabase needs when datasets are created in it
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseParams {
    pub kind: WorkspaceKind,
    /// Configuration keyword; empty where the workspace has none
    pub config_keyword: String,
    /// Spatial index grid sizes; `None` where the workspace does not use them
    pub spatial_grids: [Option<f64>; 3],
}

impl DatabaseParams {
    /// Settings for the workspace at `path`, with an optional configured keyword
    pub fn for_workspace<P: AsRef<Path>>(path: P, config_keyword: Option<&str>) -> Self {
        let path = path.as_ref();
        let kind = WorkspaceKind::detect(path);
        let is_personal = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("mdb"))
            .unwrap_or(false);

        let keyword = config_keyword
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.eq_ignore_ascii_case("none"))
            .unwrap_or("DEFAULTS")
            .to_string();

        match kind {
            WorkspaceKind::FileSystem => Self {
                kind,
                config_keyword: String::new(),
                spatial_grids: [None, None, None],
            },
            WorkspaceKind::LocalDatabase if is_personal => Self {
                kind,
                config_keyword: String::new(),
                spatial_grids: [Some(0.0), None, None],
            },
            _ => Self {
                kind,
                config_keyword: keyword,
                spatial_grids: [Some(0.0), Some(0.0), Some(0.0)],
            },
        }
    }
}

/// Scratch geodatabase for intermediate datasets.
///
/// The container is removed on drop only when this guard created it.
#[derive(Debug)]
pub struct TempWorkspace {
    path: PathBuf,
    created: bool,
}

impl TempWorkspace {
    /// Pick or create a scratch workspace for a tool run.
    ///
    /// The base is the configured MA workspace, or the current directory.
    /// Folders and enterprise connections get a fresh `matempgdb<stamp>.gdb`;
    /// local geodatabases are used as they are. The guard only owns a
    /// container it created itself. A missing base or a failed creation
    /// falls back to the base workspace with a warning.
    pub fn acquire(ctx: &ToolContext) -> Self {
        let base = ctx
            .options
            .workspace_path()
            .unwrap_or_else(|| PathBuf::from("."));

        let target_dir = match WorkspaceKind::detect(&base) {
            WorkspaceKind::LocalDatabase => {
                log::debug!("Using local database {} as scratch workspace", base.display());
                return Self::existing(base);
            }
            WorkspaceKind::FileSystem => base.clone(),
            WorkspaceKind::RemoteDatabase => std::env::temp_dir(),
        };
        if !target_dir.is_dir() {
            log::warn!(
                "Scratch location {} is not a directory. Using {}",
                target_dir.display(),
                base.display()
            );
            return Self::existing(base);
        }

        for _ in 0..CREATE_ATTEMPTS {
            let path = target_dir.join(format!("matempgdb{}.gdb", temp_stamp()));
            match fs::create_dir(&path) {
                Ok(()) => {
                    log::info!("Created scratch workspace {}", path.display());
                    return Self { path, created: true };
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("{} is taken, trying another name", path.display());
                }
                Err(e) => {
                    log::warn!(
                        "Could not create scratch workspace {}: {}. Using {}",
                        path.display(),
                        e,
                        base.display()
                    );
                    return Self::existing(base);
                }
            }
        }

        log::warn!(
            "No free scratch workspace name in {}. Using {}",
            target_dir.display(),
            base.display()
        );
        Self::existing(base)
    }

    /// Wrap a workspace this guard does not own
    pub fn existing<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            created: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created(&self) -> bool {
        self.created
    }

    /// Disown the workspace so it survives the guard
    pub fn keep(mut self) -> PathBuf {
        self.created = false;
        std::mem::take(&mut self.path)
    }

    /// Scratch path for a resource of `kind` inside this workspace
    pub fn temp_name(&self, kind: ResourceKind) -> MaResult<ScratchFile> {
        generate_temp_name(&self.path, kind).map(ScratchFile::new)
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if !self.created {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            log::warn!("Could not remove scratch workspace {}: {}", self.path.display(), e);
        } else {
            log::debug!("Removed scratch workspace {}", self.path.display());
        }
    }
}

/// A generated scratch path, deleted on drop if something was written there
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    keep: bool,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disown the path so it survives the guard
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.keep || !self.path.exists() {
            return;
        }
        let result = if self.path.is_dir() {
            fs::remove_dir_all(&self.path)
        } else {
            fs::remove_file(&self.path)
        };
        if let Err(e) = result {
            log::warn!("Could not remove scratch file {}: {}", self.path.display(), e);
        }
    }
}
