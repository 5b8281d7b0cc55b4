//! Project initialization: `gavel init` creates the `.gavel/` directory.
//!
//! ```text
//! .gavel/
//! ├── gavel.toml   # Configuration (defaults written on first init)
//! └── store/       # Key-value store: decision history, panel position
//! ```

use crate::config::{GAVEL_DIR, GavelToml};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Result of initializing a gavel project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the .gavel directory
    pub gavel_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
}

pub fn get_gavel_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(GAVEL_DIR)
}

pub fn is_initialized(project_dir: &Path) -> bool {
    get_gavel_dir(project_dir).exists()
}

/// Create `.gavel/` and its contents. Existing files are left untouched.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let gavel_dir = get_gavel_dir(project_dir);
    let created = !gavel_dir.exists();

    std::fs::create_dir_all(&gavel_dir)
        .with_context(|| format!("Failed to create directory: {}", gavel_dir.display()))?;

    let config_path = gavel_dir.join("gavel.toml");
    let toml = if config_path.exists() {
        GavelToml::load(&config_path)?
    } else {
        let toml = GavelToml::default();
        toml.save(&config_path)?;
        toml
    };

    let store_dir = if toml.storage.dir.is_absolute() {
        toml.storage.dir.clone()
    } else {
        project_dir.join(&toml.storage.dir)
    };
    std::fs::create_dir_all(&store_dir)
        .with_context(|| format!("Failed to create store directory: {}", store_dir.display()))?;

    Ok(InitResult { gavel_dir, created })
}
