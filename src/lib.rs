//! Code Atlas
//!
//! A static component atlas for Laravel-style PHP applications:
//! - Tree-sitter based PHP parsing standing in for runtime reflection
//! - Per-kind mappers (models, routes, jobs, controllers, ...) behind a registry
//! - An atlas manager dispatching scans and exports (JSON, Markdown, HTML)
//! - A relationship analysis across every kind

pub mod analysis;
pub mod error;
pub mod export;
pub mod manager;
pub mod mapper;
pub mod parser;
pub mod status;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{AtlasError, Result};

use manager::AtlasManager;
use mapper::ScanOptions;
use serde::{Deserialize, Serialize};
use status::StatusTracker;
use std::path::{Path, PathBuf};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YamlConfig {
    /// Master switch; a disabled atlas refuses to export
    pub enabled: bool,
    pub status_tracking: StatusTrackingConfig,
    pub generation: GenerationConfig,
    pub analysis: AnalysisConfig,
}

impl Default for YamlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            status_tracking: StatusTrackingConfig::default(),
            generation: GenerationConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

/// Status tracking section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTrackingConfig {
    pub enabled: bool,
    pub file_path: String,
    /// Keep every run, not only the latest
    pub track_history: bool,
    pub max_entries: usize,
}

impl Default for StatusTrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file_path: "storage/atlas/status.json".into(),
            track_history: true,
            max_entries: 100,
        }
    }
}

/// Generation section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub output_path: String,
    pub formats: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_path: "docs/atlas".into(),
            formats: vec!["json".into(), "markdown".into(), "html".into()],
        }
    }
}

/// Analysis section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub include_vendors: bool,
    pub max_depth: Option<usize>,
    /// Roots used by `analyze` when none are given on the command line
    pub scan_paths: Vec<String>,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub enabled: bool,
    pub status_tracking: StatusTrackingConfig,
    pub output_path: PathBuf,
    pub formats: Vec<String>,
    pub include_vendors: bool,
    pub max_depth: Option<usize>,
    pub scan_paths: Vec<PathBuf>,
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!("Ignoring {}={:?}: expected a boolean", name, value);
            None
        }
    }
}

fn split_paths(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "atlas.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let mut status_tracking = yaml.status_tracking;
        if let Ok(path) = std::env::var("ATLAS_STATUS_FILE") {
            status_tracking.file_path = path;
        }

        Ok(Self {
            enabled: env_flag("ATLAS_ENABLED").unwrap_or(yaml.enabled),
            status_tracking,
            output_path: std::env::var("ATLAS_OUTPUT_PATH")
                .unwrap_or(yaml.generation.output_path)
                .into(),
            formats: yaml.generation.formats,
            include_vendors: env_flag("ATLAS_INCLUDE_VENDORS")
                .unwrap_or(yaml.analysis.include_vendors),
            max_depth: std::env::var("ATLAS_MAX_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(yaml.analysis.max_depth),
            scan_paths: std::env::var("ATLAS_SCAN_PATHS")
                .map(|s| split_paths(&s))
                .unwrap_or_else(|_| yaml.analysis.scan_paths.iter().map(PathBuf::from).collect()),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("atlas.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Scan options carrying the analysis settings
    pub fn scan_options(&self, paths: Vec<PathBuf>) -> ScanOptions {
        ScanOptions {
            paths,
            max_depth: self.max_depth,
            include_vendors: self.include_vendors,
            ..Default::default()
        }
    }
}

/// Everything a command needs: configuration, the manager and the status tracker
pub struct AtlasContext {
    pub config: Config,
    pub manager: AtlasManager,
    pub status: StatusTracker,
}

impl AtlasContext {
    /// Create the context for a project rooted at `root`
    pub fn new(config: Config, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let status = StatusTracker::new(&config.status_tracking, &root);
        Self {
            manager: AtlasManager::new(root),
            status,
            config,
        }
    }

    /// Fail when the atlas is switched off
    pub fn ensure_enabled(&self) -> anyhow::Result<()> {
        if !self.config.enabled {
            anyhow::bail!("Code atlas is disabled (set `enabled: true` or ATLAS_ENABLED=1)");
        }
        Ok(())
    }

    /// Output directory, resolved against the project root
    pub fn output_dir(&self) -> PathBuf {
        if self.config.output_path.is_absolute() {
            self.config.output_path.clone()
        } else {
            self.manager.base_path().join(&self.config.output_path)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
enabled: false
status_tracking:
  enabled: true
  file_path: /var/atlas/status.json
  track_history: false
  max_entries: 5
generation:
  output_path: build/atlas
  formats: [json]
analysis:
  include_vendors: true
  max_depth: 4
  scan_paths:
    - app
    - modules
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.status_tracking.file_path, "/var/atlas/status.json");
        assert!(!config.status_tracking.track_history);
        assert_eq!(config.status_tracking.max_entries, 5);
        assert_eq!(config.generation.output_path, "build/atlas");
        assert_eq!(config.generation.formats, vec!["json"]);
        assert!(config.analysis.include_vendors);
        assert_eq!(config.analysis.max_depth, Some(4));
        assert_eq!(config.analysis.scan_paths, vec!["app", "modules"]);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert!(config.enabled);
        assert!(config.status_tracking.enabled);
        assert_eq!(config.status_tracking.max_entries, 100);
        assert_eq!(config.generation.output_path, "docs/atlas");
        assert_eq!(config.generation.formats.len(), 3);
        assert!(!config.analysis.include_vendors);
        assert!(config.analysis.max_depth.is_none());

        let partial: YamlConfig = serde_yaml::from_str("generation:\n  formats: [html]\n").unwrap();
        assert!(partial.enabled);
        assert_eq!(partial.generation.output_path, "docs/atlas");
    }

    #[test]
    fn test_split_paths() {
        assert_eq!(
            split_paths("app, modules/Blog ,,"),
            vec![PathBuf::from("app"), PathBuf::from("modules/Blog")]
        );
    }

    /// Combined test for YAML file loading, env var overrides, and fallbacks.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "ATLAS_ENABLED",
                "ATLAS_OUTPUT_PATH",
                "ATLAS_SCAN_PATHS",
                "ATLAS_MAX_DEPTH",
                "ATLAS_INCLUDE_VENDORS",
                "ATLAS_STATUS_FILE",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
generation:
  output_path: public/atlas
analysis:
  max_depth: 3
  scan_paths: [app]
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("atlas.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert!(config.enabled);
        assert_eq!(config.output_path, PathBuf::from("public/atlas"));
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.scan_paths, vec![PathBuf::from("app")]);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("ATLAS_ENABLED", "false");
        std::env::set_var("ATLAS_MAX_DEPTH", "7");
        std::env::set_var("ATLAS_SCAN_PATHS", "app/Models,app/Jobs");
        std::env::set_var("ATLAS_STATUS_FILE", "/tmp/atlas-status.json");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.max_depth, Some(7));
        assert_eq!(
            config.scan_paths,
            vec![PathBuf::from("app/Models"), PathBuf::from("app/Jobs")]
        );
        assert_eq!(config.status_tracking.file_path, "/tmp/atlas-status.json");
        // YAML value still used where no env override
        assert_eq!(config.output_path, PathBuf::from("public/atlas"));

        let context = AtlasContext::new(config, dir.path());
        assert!(context.ensure_enabled().is_err());

        clear_env();

        // --- Phase 3: Unparsable YAML → defaults ---
        std::fs::write(&file_path, "enabled: [not, a, bool").unwrap();
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert!(config.enabled);
        assert_eq!(config.output_path, PathBuf::from("docs/atlas"));

        // --- Phase 4: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-atlas-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert!(config.scan_paths.is_empty());
        assert!(config.max_depth.is_none());
    }

    #[test]
    fn test_context_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = YamlConfig::default();
        let config = Config {
            enabled: true,
            status_tracking: yaml.status_tracking,
            output_path: PathBuf::from("docs/atlas"),
            formats: yaml.generation.formats,
            include_vendors: false,
            max_depth: None,
            scan_paths: vec![],
        };
        let context = AtlasContext::new(config, dir.path());
        assert_eq!(context.output_dir(), dir.path().join("docs/atlas"));
        assert!(context.ensure_enabled().is_ok());
        assert_eq!(
            context.status.path(),
            dir.path().join("storage/atlas/status.json")
        );
    }
}
