//! Configuration view and validation commands (`gavel config`).

use anyhow::{Context, Result};

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(
    project_dir: &std::path::Path,
    cli: &Cli,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let config = super::load_config(project_dir, cli)?;
    let config_path = config.config_path();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Gavel Configuration");
            println!("===================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No gavel.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let rendered =
                toml::to_string_pretty(&config.toml).context("Failed to render configuration")?;
            println!("{}", rendered.trim_end());
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  store_dir = \"{}\"", config.store_dir.display());
            println!("  history.capacity = {}", config.toml.history.capacity);

            let store = gavel::storage::FileStore::new(&config.store_dir);
            let position = gavel::ui::PanelPosition::load(&store, &config.toml.ui.position_key);
            println!("  panel position = ({}, {})", position.x, position.y);
            println!();
        }
        Some(ConfigCommands::Position { x, y }) => {
            let store = gavel::storage::FileStore::new(&config.store_dir);
            gavel::ui::PanelPosition::new(x, y)
                .save(&store, &config.toml.ui.position_key)
                .context("Failed to store panel position")?;
            println!("Panel position set to ({}, {})", x, y);
        }
        Some(ConfigCommands::Validate) => {
            if config_path.exists() {
                println!("Validating {}", config_path.display());
            } else {
                println!("No gavel.toml found; validating defaults");
            }

            let warnings = config.toml.validate();
            if warnings.is_empty() {
                println!("Configuration is valid");
            } else {
                println!("Warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
        }
    }

    Ok(())
}
