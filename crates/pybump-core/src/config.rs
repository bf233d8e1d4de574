//! Configuration loading and discovery.
//!
//! Sources are layered with [`figment`], lowest precedence first:
//! 1. Built-in defaults
//! 2. User config: `~/.config/pybump/config.<ext>`
//! 3. Project config: `.pybump.<ext>` or `pybump.<ext>` in the search root or
//!    any parent, stopping at a `.git` boundary
//! 4. Explicit files added with [`ConfigLoader::with_file`]
//!
//! Where `<ext>` is one of `toml`, `yaml`, `yml`, `json`.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use pybump_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::from(".");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! assert_eq!(config.files.primary, "pyproject.toml");
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// The configuration for pybump.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Which files hold the version.
    pub files: FilesConfig,
}

/// Names of the files that carry the version.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilesConfig {
    /// Project metadata file in the project root. Must exist.
    pub primary: String,
    /// File name looked for one directory below the project root.
    ///
    /// The first one holding a `__version__` assignment is kept in sync.
    pub secondary: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            primary: "pyproject.toml".into(),
            secondary: "__init__.py".into(),
        }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "pybump";

/// Marks the top of a repository; project config search stops there.
const BOUNDARY_MARKER: &str = ".git";

/// Builder for loading configuration from multiple sources.
#[derive(Debug)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    explicit_files: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/pybump/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Add an explicit config file to load. Later files take precedence.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if self.include_user_config
            && let Some(user_config) = find_user_config()
        {
            tracing::debug!(path = %user_config, "merging user config");
            figment = merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = find_project_config(root)
        {
            tracing::debug!(path = %project_config, "merging project config");
            figment = merge_file(figment, &project_config);
        }

        for file in &self.explicit_files {
            if !file.is_file() {
                return Err(ConfigError::Missing(file.clone()));
            }
            figment = merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::debug!(
            log_level = config.log_level.as_str(),
            primary = %config.files.primary,
            secondary = %config.files.secondary,
            "configuration loaded"
        );
        Ok(config)
    }
}

/// Find project config by walking up from the given directory.
///
/// The directory holding [`BOUNDARY_MARKER`] is the last one searched.
fn find_project_config(start: &Utf8Path) -> Option<Utf8PathBuf> {
    for dir in start.ancestors() {
        if let Some(found) = config_in_dir(dir) {
            return Some(found);
        }

        if dir.join(BOUNDARY_MARKER).exists() {
            break;
        }
    }
    None
}

/// Look for `.pybump.<ext>` then `pybump.<ext>` in a single directory.
fn config_in_dir(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    CONFIG_EXTENSIONS.iter().find_map(|ext| {
        [
            dir.join(format!(".{APP_NAME}.{ext}")),
            dir.join(format!("{APP_NAME}.{ext}")),
        ]
        .into_iter()
        .find(|candidate| candidate.is_file())
    })
}

fn find_user_config() -> Option<Utf8PathBuf> {
    let config_dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| config_dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

/// Merge a config file into the figment, detecting format from extension.
fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

/// Get the user config directory path.
///
/// Returns `~/.config/pybump/` on Linux, `~/Library/Application Support/pybump/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::try_from(path.to_path_buf()).unwrap()
    }

    fn isolated() -> ConfigLoader {
        ConfigLoader::new().with_user_config(false)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert_eq!(config.files.primary, "pyproject.toml");
        assert_eq!(config.files.secondary, "__init__.py");
    }

    #[test]
    fn test_loader_builds_with_defaults() {
        let config = isolated().load().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_single_file_overrides_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"log_level = "debug"
log_dir = "/tmp/pybump"
"#,
        )
        .unwrap();

        let config = isolated().with_file(utf8(&config_path)).load().unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.log_dir.as_ref().map(|dir| dir.as_str()),
            Some("/tmp/pybump")
        );
    }

    #[test]
    fn test_files_section_is_partial() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[files]
secondary = "_version.py"
"#,
        )
        .unwrap();

        let config = isolated().with_file(utf8(&config_path)).load().unwrap();

        assert_eq!(config.files.primary, "pyproject.toml");
        assert_eq!(config.files.secondary, "_version.py");
    }

    #[test]
    fn test_later_file_overrides_earlier() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("base.toml");
        fs::write(&base, r#"log_level = "warn""#).unwrap();
        let over = tmp.path().join("override.json");
        fs::write(&over, r#"{"log_level": "error"}"#).unwrap();

        let config = isolated()
            .with_file(utf8(&base))
            .with_file(utf8(&over))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn test_yaml_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "files:\n  primary: setup.cfg\n").unwrap();

        let config = isolated().with_file(utf8(&path)).load().unwrap();
        assert_eq!(config.files.primary, "setup.cfg");
    }

    #[test]
    fn test_project_config_discovery() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        let sub_dir = project_dir.join("src").join("deep");
        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(project_dir.join(".pybump.toml"), r#"log_level = "debug""#).unwrap();

        let config = isolated()
            .with_project_search(utf8(&sub_dir))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_dotfile_preferred_over_regular_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".pybump.toml"), r#"log_level = "debug""#).unwrap();
        fs::write(tmp.path().join("pybump.toml"), r#"log_level = "error""#).unwrap();

        let config = isolated()
            .with_project_search(utf8(tmp.path()))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_boundary_marker_stops_search() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        let work = child.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(parent.join(".pybump.toml"), r#"log_level = "warn""#).unwrap();
        fs::create_dir(child.join(".git")).unwrap();

        let config = isolated()
            .with_project_search(utf8(&work))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_config_next_to_boundary_is_found() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join("pybump.toml"), r#"log_level = "warn""#).unwrap();

        let config = isolated()
            .with_project_search(utf8(tmp.path()))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_explicit_file_overrides_project_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".pybump.toml"), r#"log_level = "warn""#).unwrap();
        let over = tmp.path().join("override.toml");
        fs::write(&over, r#"log_level = "error""#).unwrap();

        let config = isolated()
            .with_project_search(utf8(tmp.path()))
            .with_file(utf8(&over))
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = isolated()
            .with_file(utf8(&tmp.path().join("nope.toml")))
            .load();

        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, r#"log_level = "loud""#).unwrap();

        let result = isolated().with_file(utf8(&path)).load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_user_config_dir() {
        if let Some(path) = user_config_dir() {
            assert!(path.as_str().contains("pybump"));
        }
    }
}
