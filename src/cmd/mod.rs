//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `project` | `Init`           |
//! | `review`  | `Review`         |
//! | `history` | `History`        |
//! | `config`  | `Config`         |

pub mod config;
pub mod history;
pub mod project;
pub mod review;

pub use config::cmd_config;
pub use history::cmd_history;
pub use project::cmd_init;
pub use review::cmd_review;

use anyhow::Result;
use std::path::Path;

/// Resolve configuration for a command, applying the global CLI overrides.
fn load_config(project_dir: &Path, cli: &super::Cli) -> Result<gavel::config::GavelConfig> {
    gavel::config::GavelConfig::with_cli_args(
        project_dir,
        cli.store_dir.clone(),
        cli.history_capacity,
    )
}
