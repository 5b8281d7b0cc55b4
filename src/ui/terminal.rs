use super::icons::{CHECK, CROSS, GAVEL, LOCK, PENCIL, SKIP};
use super::{ReviewPresenter, SessionView};
use crate::review::{Decision, DecisionRecord};
use console::style;

/// Longest field preview printed before truncating.
const PREVIEW_CHARS: usize = 240;

/// Prints the open review to stderr.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl TerminalPresenter {
    pub fn new() -> Self {
        Self
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut)
}

/// Render a review the way the terminal presenter shows it.
pub fn render_review(view: &SessionView<'_>) -> String {
    let request = view.request;
    let mut out = String::new();

    out.push_str(&format!(
        "{}{} {}\n",
        GAVEL,
        style("Review").bold(),
        style(format!("phase {}", request.phase_id)).cyan()
    ));
    if let Some(action) = &request.action_id {
        out.push_str(&format!("  {} {}\n", style("action").dim(), action));
    }
    out.push_str(&format!("  {} {}\n", style("id").dim(), request.id));
    if !request.prompt.is_empty() {
        out.push_str(&format!("\n  {}\n", request.prompt));
    }
    out.push('\n');

    if request.is_scalar() {
        let text = request.field_text(crate::review::OUTPUT_FIELD).unwrap_or_default();
        let icon = if request.is_editable(crate::review::OUTPUT_FIELD) {
            PENCIL
        } else {
            LOCK
        };
        out.push_str(&format!("  {}{}\n", icon, style("output").bold()));
        out.push_str(&format!("    {}\n", preview(&text)));
    } else if let Some(fields) = request.current_output.as_object() {
        for (name, _) in fields {
            let icon = if request.is_editable(name) { PENCIL } else { LOCK };
            let text = view
                .edited_values
                .get(name)
                .cloned()
                .or_else(|| request.field_text(name))
                .unwrap_or_default();
            out.push_str(&format!("  {}{}\n", icon, style(name).bold()));
            out.push_str(&format!("    {}\n", preview(&text)));
        }
    }

    if request.can_skip {
        out.push_str(&format!("\n  {}\n", style("approve / reject / skip").dim()));
    } else {
        out.push_str(&format!("\n  {}\n", style("approve / reject").dim()));
    }
    out
}

/// One-line summary of a past decision.
pub fn render_record(record: &DecisionRecord) -> String {
    let (icon, label) = match record.decision {
        Decision::Approved => (CHECK, style(record.decision.as_str()).green()),
        Decision::Rejected => (CROSS, style(record.decision.as_str()).red()),
        Decision::Skipped => (SKIP, style(record.decision.as_str()).yellow()),
    };
    let mut line = format!(
        "{}{} {} {} {}",
        icon,
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        label,
        style(&record.phase_id).cyan(),
        style(&record.gavel_id).dim()
    );
    if !record.edited_values.is_empty() {
        let fields: Vec<&str> = record.edited_values.keys().map(String::as_str).collect();
        line.push_str(&format!(" edited: {}", fields.join(", ")));
    }
    if !record.commentary.is_empty() {
        line.push_str(&format!(" \"{}\"", preview(&record.commentary)));
    }
    line
}

impl ReviewPresenter for TerminalPresenter {
    fn show(&self, view: SessionView<'_>) {
        eprintln!("{}", render_review(&view));
    }

    fn hide(&self) {
        eprintln!("{}", style("Review closed").dim());
    }
}
