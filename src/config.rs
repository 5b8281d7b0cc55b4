//! Configuration for the review gate, read from `.gavel/gavel.toml`.
//!
//! Layered: file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [history]
//! capacity = 50
//! key = "gavel.history"
//!
//! [storage]
//! dir = ".gavel/store"
//!
//! [ui]
//! position_key = "gavel.panel_position"
//! ```

use crate::ledger::{DEFAULT_CAPACITY, DEFAULT_HISTORY_KEY};
use crate::review::GateConfig;
use crate::ui::position::DEFAULT_POSITION_KEY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project directory.
pub const GAVEL_DIR: &str = ".gavel";

/// Environment variable overriding `[storage] dir`.
pub const STORE_DIR_ENV: &str = "GAVEL_STORE_DIR";

/// Decision history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySection {
    /// Maximum number of decisions kept
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Storage key for the serialized history
    #[serde(default = "default_history_key")]
    pub key: String,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_history_key() -> String {
    DEFAULT_HISTORY_KEY.to_string()
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            key: default_history_key(),
        }
    }
}

/// Key-value store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Store directory, relative to the project directory unless absolute
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(GAVEL_DIR).join("store")
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSection {
    /// Storage key for the navigation panel position
    #[serde(default = "default_position_key")]
    pub position_key: String,
}

fn default_position_key() -> String {
    DEFAULT_POSITION_KEY.to_string()
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            position_key: default_position_key(),
        }
    }
}

/// The complete gavel.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GavelToml {
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub ui: UiSection,
}

impl GavelToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse gavel.toml")
    }

    /// Load `<gavel_dir>/gavel.toml`, or defaults if it does not exist.
    pub fn load_or_default(gavel_dir: &Path) -> Result<Self> {
        let config_path = gavel_dir.join("gavel.toml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize gavel.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.history.capacity == 0 {
            warnings.push("history.capacity is 0; at least one decision is always kept".to_string());
        }
        if self.history.key.trim().is_empty() {
            warnings.push("history.key is empty".to_string());
        }
        if self.ui.position_key.trim().is_empty() {
            warnings.push("ui.position_key is empty".to_string());
        }
        if self.history.key == self.ui.position_key {
            warnings.push(format!(
                "history.key and ui.position_key are both '{}'; they would overwrite each other",
                self.history.key
            ));
        }

        warnings
    }
}

/// Resolved configuration: gavel.toml plus environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct GavelConfig {
    pub project_dir: PathBuf,
    pub gavel_dir: PathBuf,
    pub toml: GavelToml,
    /// Where the file store keeps its keys
    pub store_dir: PathBuf,
}

impl GavelConfig {
    pub fn load(project_dir: &Path) -> Result<Self> {
        Self::with_cli_args(project_dir, None, None)
    }

    pub fn with_cli_args(
        project_dir: &Path,
        cli_store_dir: Option<PathBuf>,
        cli_capacity: Option<usize>,
    ) -> Result<Self> {
        let gavel_dir = project_dir.join(GAVEL_DIR);
        let mut toml = GavelToml::load_or_default(&gavel_dir)?;
        if let Some(capacity) = cli_capacity {
            toml.history.capacity = capacity;
        }

        let store_dir = resolve_store_dir(
            project_dir,
            &toml,
            std::env::var(STORE_DIR_ENV).ok(),
            cli_store_dir,
        );

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            gavel_dir,
            toml,
            store_dir,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.gavel_dir.join("gavel.toml")
    }

    pub fn is_initialized(&self) -> bool {
        self.gavel_dir.exists()
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            history_capacity: self.toml.history.capacity,
            history_key: self.toml.history.key.clone(),
        }
    }
}

/// CLI beats environment beats file. Relative paths hang off the project directory.
fn resolve_store_dir(
    project_dir: &Path,
    toml: &GavelToml,
    env: Option<String>,
    cli: Option<PathBuf>,
) -> PathBuf {
    let dir = cli
        .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| toml.storage.dir.clone());
    if dir.is_absolute() {
        dir
    } else {
        project_dir.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = GavelToml::parse("").unwrap();
        assert_eq!(toml.history.capacity, 50);
        assert_eq!(toml.history.key, "gavel.history");
        assert_eq!(toml.ui.position_key, "gavel.panel_position");
        assert_eq!(toml.storage.dir, PathBuf::from(".gavel/store"));
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml = GavelToml::parse(
            r#"
[history]
capacity = 10
"#,
        )
        .unwrap();
        assert_eq!(toml.history.capacity, 10);
        assert_eq!(toml.history.key, "gavel.history");
    }

    #[test]
    fn test_parse_invalid_toml_errors() {
        let err = GavelToml::parse("[history\ncapacity = ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse gavel.toml"));
    }

    #[test]
    fn test_validate_flags_colliding_keys_and_zero_capacity() {
        let mut toml = GavelToml::default();
        toml.history.capacity = 0;
        toml.ui.position_key = toml.history.key.clone();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("capacity")));
        assert!(warnings.iter().any(|w| w.contains("overwrite")));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gavel.toml");
        let mut toml = GavelToml::default();
        toml.history.capacity = 7;
        toml.save(&path).unwrap();

        let loaded = GavelToml::load(&path).unwrap();
        assert_eq!(loaded.history.capacity, 7);
    }

    #[test]
    fn test_config_reads_project_file_and_cli_override() {
        let dir = tempdir().unwrap();
        let gavel_dir = dir.path().join(GAVEL_DIR);
        std::fs::create_dir_all(&gavel_dir).unwrap();
        std::fs::write(gavel_dir.join("gavel.toml"), "[history]\ncapacity = 12\n").unwrap();

        let config = GavelConfig::load(dir.path()).unwrap();
        assert!(config.is_initialized());
        assert_eq!(config.gate_config().history_capacity, 12);

        let config = GavelConfig::with_cli_args(dir.path(), None, Some(3)).unwrap();
        assert_eq!(config.gate_config().history_capacity, 3);
    }

    #[test]
    fn test_store_dir_precedence() {
        let project = Path::new("/work/project");
        let toml = GavelToml::default();

        assert_eq!(
            resolve_store_dir(project, &toml, None, None),
            PathBuf::from("/work/project/.gavel/store")
        );
        assert_eq!(
            resolve_store_dir(project, &toml, Some("/var/gavel".into()), None),
            PathBuf::from("/var/gavel")
        );
        assert_eq!(
            resolve_store_dir(project, &toml, Some("".into()), None),
            PathBuf::from("/work/project/.gavel/store")
        );
        assert_eq!(
            resolve_store_dir(
                project,
                &toml,
                Some("/var/gavel".into()),
                Some(PathBuf::from("local-store"))
            ),
            PathBuf::from("/work/project/local-store")
        );
    }
}
