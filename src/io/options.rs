//! MA options file and the per-run tool context

use crate::types::{Envelope, MaError, MaResult};
use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable naming an options file to use instead of the default
pub const OPTIONS_ENV: &str = "MA_OPTIONS";

const OPTIONS_DIR: &str = "matools";
const OPTIONS_FILE: &str = "ma_options.xml";

/// Root of the options document:
/// `<MAOptions><General><GeneralWorkspacePathName>...</GeneralWorkspacePathName></General></MAOptions>`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename = "MAOptions")]
pub struct MaOptions {
    #[serde(rename = "General", default)]
    pub general: GeneralOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GeneralOptions {
    /// Workspace that scratch geodatabases are created in
    #[serde(
        rename = "GeneralWorkspacePathName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub workspace_path_name: Option<String>,

    /// Distance units tools fall back to when none are given
    #[serde(
        rename = "GeneralDistanceUnits",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub distance_units: Option<String>,
}

impl MaOptions {
    /// Parse an options document
    pub fn from_xml(xml: &str) -> MaResult<Self> {
        from_str::<MaOptions>(xml)
            .map_err(|e| MaError::Options(format!("Failed to parse MA options: {}", e)))
    }

    pub fn to_xml(&self) -> MaResult<String> {
        to_string(self).map_err(|e| MaError::Options(format!("Failed to write MA options: {}", e)))
    }

    /// Read options from a file; a missing file yields the defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> MaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No MA options at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let xml = fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// Read options from `MA_OPTIONS` or the user config directory.
    ///
    /// Unreadable options are reported and replaced by the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::debug!("No config directory available, using default MA options");
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("Could not read MA options from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Location of the options file: `MA_OPTIONS`, else `<config dir>/matools/ma_options.xml`
    pub fn default_path() -> Option<PathBuf> {
        match std::env::var_os(OPTIONS_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => dirs::config_dir().map(|dir| dir.join(OPTIONS_DIR).join(OPTIONS_FILE)),
        }
    }

    /// Write the options file, replacing any previous one atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> MaResult<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(self.to_xml()?.as_bytes())?;
        staged.persist(path).map_err(|e| MaError::Io(e.error))?;
        log::info!("Saved MA options to {}", path.display());
        Ok(())
    }

    /// Configured scratch workspace, if set and non-empty
    pub fn workspace_path(&self) -> Option<PathBuf> {
        self.general
            .workspace_path_name
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

/// Settings a tool run works against, passed explicitly to every tool
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Current workspace for relative dataset names
    pub workspace: PathBuf,
    /// Processing extent, when restricted
    pub extent: Option<Envelope>,
    /// Configuration keyword for enterprise geodatabases
    pub config_keyword: Option<String>,
    pub options: MaOptions,
}

impl ToolContext {
    pub fn new<P: Into<PathBuf>>(workspace: P) -> Self {
        Self {
            workspace: workspace.into(),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: MaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_extent(mut self, extent: Envelope) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Resolve a dataset name against the current workspace
    pub fn dataset_path(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Distance units from the options, defaulting to meters
    pub fn distance_units(&self) -> &str {
        self.options
            .general
            .distance_units
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or("meters")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const OPTIONS_XML: &str = r#"<MAOptions>
  <General>
    <GeneralWorkspacePathName>/data/scratch</GeneralWorkspacePathName>
    <GeneralDistanceUnits>Kilometers</GeneralDistanceUnits>
  </General>
</MAOptions>"#;

    #[test]
    fn test_parse_options() {
        let options = MaOptions::from_xml(OPTIONS_XML).unwrap();
        assert_eq!(options.workspace_path(), Some(PathBuf::from("/data/scratch")));

        let ctx = ToolContext::new("/work").with_options(options);
        assert_eq!(ctx.distance_units(), "Kilometers");
        assert_eq!(ctx.dataset_path("obs.shp"), PathBuf::from("/work/obs.shp"));
        assert_eq!(ctx.dataset_path("/other/obs.shp"), PathBuf::from("/other/obs.shp"));
    }

    #[test]
    fn test_missing_general_section() {
        let options = MaOptions::from_xml("<MAOptions></MAOptions>").unwrap();
        assert_eq!(options, MaOptions::default());
        assert!(options.workspace_path().is_none());
        assert_eq!(ToolContext::default().distance_units(), "meters");
    }

    #[test]
    fn test_malformed_options() {
        assert!(matches!(
            MaOptions::from_xml("<MAOptions><General>"),
            Err(MaError::Options(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ma_options.xml");

        assert_eq!(MaOptions::load_from(&path).unwrap(), MaOptions::default());

        let mut options = MaOptions::default();
        options.general.workspace_path_name = Some("/tmp/ws".to_string());
        options.save(&path).unwrap();
        assert_eq!(MaOptions::load_from(&path).unwrap(), options);
    }
}
