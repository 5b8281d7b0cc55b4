//! Decision history (`gavel history`).

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use super::super::{Cli, HistoryCommands};

pub fn cmd_history(
    project_dir: &Path,
    cli: &Cli,
    command: Option<HistoryCommands>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    use gavel::ledger::DecisionLedger;
    use gavel::storage::FileStore;
    use gavel::ui::terminal::render_record;

    let config = super::load_config(project_dir, cli)?;
    let gate_config = config.gate_config();
    let store = Arc::new(FileStore::new(&config.store_dir));
    let mut ledger = DecisionLedger::new(
        store,
        &gate_config.history_key,
        gate_config.history_capacity,
    );
    ledger.load();

    if let Some(HistoryCommands::Clear) = command {
        let cleared = ledger.len();
        ledger.clear().context("Failed to clear decision history")?;
        println!("Cleared {} decision(s) from history", cleared);
        return Ok(());
    }

    let mut records = ledger.list();
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).context("Failed to serialize history")?
        );
        return Ok(());
    }

    if records.is_empty() {
        println!("No review decisions recorded");
        return Ok(());
    }

    for record in &records {
        println!("{}", render_record(record));
    }

    Ok(())
}
