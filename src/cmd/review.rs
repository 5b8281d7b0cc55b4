//! Review a request from the command line (`gavel review`).
//!
//! The request is opened on a gate backed by the project's file store. Each
//! call the gate makes against the engine is printed to stdout as one JSON
//! line, so a wrapping pipeline can pick the decision up.

use anyhow::{Context, Result, bail};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use std::path::Path;
use std::sync::Arc;

use super::super::Cli;
use gavel::engine::RecordingEngine;
use gavel::review::{
    DecideOutcome, DecisionAction, IgnoredReason, ReviewGate, ReviewRequest,
};
use gavel::storage::FileStore;
use gavel::ui::TerminalPresenter;
use gavel::ui::terminal::render_record;

pub async fn cmd_review(
    project_dir: &Path,
    cli: &Cli,
    request_path: &Path,
    action: Option<&str>,
    edits: &[String],
    commentary: Option<&str>,
) -> Result<()> {
    let config = super::load_config(project_dir, cli)?;

    let raw = std::fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read review request {}", request_path.display()))?;
    let request: ReviewRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse review request {}", request_path.display()))?;

    let engine = Arc::new(RecordingEngine::new());
    let store = Arc::new(FileStore::new(&config.store_dir));
    let gate = Arc::new(
        ReviewGate::new(engine.clone(), store, config.gate_config())
            .with_presenter(Arc::new(TerminalPresenter::new())),
    );
    gate.init();

    let pending = gate.open(request)?;

    let outcome = match action {
        Some(action) => {
            let action: DecisionAction = action.parse()?;
            decide_from_flags(&gate, action, edits, commentary).await?
        }
        None => decide_interactively(&gate).await?,
    };
    if let DecideOutcome::Ignored(reason) = outcome {
        bail!("Decision was not applied: {:?}", reason);
    }

    let record = pending.await?;
    for call in engine.calls() {
        println!(
            "{}",
            serde_json::to_string(&call).context("Failed to serialize engine call")?
        );
    }
    eprintln!("{}", render_record(&record));

    Ok(())
}

/// Parse `FIELD=VALUE`. The value may itself contain `=`.
fn parse_edit(edit: &str) -> Result<(&str, &str)> {
    match edit.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok((field.trim(), value)),
        _ => bail!("Invalid edit '{}'. Expected FIELD=VALUE", edit),
    }
}

/// The prompt's text, unless the reviewer left the pre-filled value as it was.
fn changed_edit<'a>(current: &str, value: &'a str) -> Option<&'a str> {
    (value != current).then_some(value)
}

async fn decide_from_flags(
    gate: &ReviewGate,
    action: DecisionAction,
    edits: &[String],
    commentary: Option<&str>,
) -> Result<DecideOutcome> {
    for edit in edits {
        let (field, value) = parse_edit(edit)?;
        if !gate.set_edited_value(field, value) {
            bail!("Field '{}' is not editable in this review", field);
        }
    }
    if let Some(text) = commentary {
        gate.set_commentary(text);
    }

    let outcome = gate.decide(action).await;
    if outcome == DecideOutcome::Ignored(IgnoredReason::SkipNotAllowed) {
        bail!("This review cannot be skipped");
    }
    Ok(outcome)
}

enum MenuItem {
    Edit(String),
    Commentary,
    Decide(DecisionAction),
}

async fn decide_interactively(gate: &ReviewGate) -> Result<DecideOutcome> {
    let request = gate
        .current_request()
        .context("Review closed before it could be shown")?;
    let theme = ColorfulTheme::default();
    let mut commentary = String::new();

    let mut items: Vec<(String, MenuItem)> = request
        .editable_fields
        .iter()
        .map(|field| (format!("Edit {}", field), MenuItem::Edit(field.clone())))
        .collect();
    items.push(("Write commentary".to_string(), MenuItem::Commentary));
    items.push(("Approve".to_string(), MenuItem::Decide(DecisionAction::Approve)));
    items.push(("Reject".to_string(), MenuItem::Decide(DecisionAction::Reject)));
    if request.can_skip {
        items.push(("Skip".to_string(), MenuItem::Decide(DecisionAction::Skip)));
    }
    let labels: Vec<&str> = items.iter().map(|(label, _)| label.as_str()).collect();

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("Review action")
            .items(&labels[..])
            .default(0)
            .interact()?;

        match &items[selection].1 {
            MenuItem::Edit(field) => {
                let current = request.field_text(field).unwrap_or_default();
                let value: String = Input::with_theme(&theme)
                    .with_prompt(field.as_str())
                    .with_initial_text(current.clone())
                    .allow_empty(true)
                    .interact_text()?;
                if let Some(value) = changed_edit(&current, &value) {
                    gate.set_edited_value(field, value);
                }
            }
            MenuItem::Commentary => {
                commentary = Input::with_theme(&theme)
                    .with_prompt("Commentary")
                    .with_initial_text(commentary.clone())
                    .allow_empty(true)
                    .interact_text()?;
                gate.set_commentary(&commentary);
            }
            MenuItem::Decide(action) => {
                let outcome = gate.decide(*action).await;
                if outcome.is_decided() {
                    return Ok(outcome);
                }
            }
        }
    }
}
