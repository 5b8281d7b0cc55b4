//! Review gate ("gavel"): the human-approval checkpoint of a pipeline phase.
//!
//! The gate owns at most one open [`ReviewRequest`] at a time. A reviewer
//! edits fields and commentary, then approves, rejects or skips. The
//! decision is reconciled, forwarded to the orchestration engine, recorded
//! in the decision ledger and handed back to whoever opened the review.
//!
//! ## Usage
//!
//! ```no_run
//! use gavel::review::{ReviewGate, ReviewRequest, GateConfig};
//! use gavel::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example(engine: Arc<dyn gavel::engine::OrchestrationEngine>) -> anyhow::Result<()> {
//! let gate = Arc::new(ReviewGate::new(engine, Arc::new(MemoryStore::new()), GateConfig::default()));
//! gate.init();
//!
//! let request = ReviewRequest::new("draft", "Check the draft", serde_json::json!("draft text"))
//!     .with_editable_fields(["output"]);
//! let pending = gate.open(request)?;
//!
//! gate.set_edited_value("output", "revised text");
//! gate.approve_current().await;
//!
//! let record = pending.await?;
//! println!("{}", record.decision);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub mod dispatcher;
pub mod gate;
pub mod reconcile;
pub mod session;

pub use dispatcher::DecisionDispatcher;
pub use gate::{DecideOutcome, GateConfig, GateState, IgnoredReason, ReviewGate};
pub use reconcile::{Reconciled, reconcile};
pub use session::{PendingDecision, ReviewSession, Waiter};

/// Field name that stands for the whole output when the output is a scalar.
pub const OUTPUT_FIELD: &str = "output";

/// A review raised by the orchestration engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub id: String,
    #[serde(alias = "phaseId")]
    pub phase_id: String,
    #[serde(default, alias = "actionId", skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default)]
    pub prompt: String,
    /// Objects are field mappings; any other value is a scalar output.
    #[serde(alias = "currentOutput")]
    pub current_output: Value,
    #[serde(default, alias = "editableFields")]
    pub editable_fields: Vec<String>,
    #[serde(default, alias = "canSkip")]
    pub can_skip: bool,
}

impl ReviewRequest {
    /// Create a request with a fresh id, no editable fields and skipping disallowed.
    pub fn new(phase_id: &str, prompt: &str, current_output: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phase_id: phase_id.to_string(),
            action_id: None,
            prompt: prompt.to_string(),
            current_output,
            editable_fields: Vec::new(),
            can_skip: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_action(mut self, action_id: &str) -> Self {
        self.action_id = Some(action_id.to_string());
        self
    }

    pub fn with_editable_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.editable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn skippable(mut self, can_skip: bool) -> Self {
        self.can_skip = can_skip;
        self
    }

    /// Whether the output under review is a single value rather than a field mapping.
    pub fn is_scalar(&self) -> bool {
        !self.current_output.is_object()
    }

    pub fn is_editable(&self, field: &str) -> bool {
        self.editable_fields.iter().any(|f| f == field)
    }

    /// Current value of an editable field, rendered as the text a reviewer would edit.
    ///
    /// Strings are shown verbatim; anything else is shown as compact JSON.
    pub fn field_text(&self, field: &str) -> Option<String> {
        let value = if field == OUTPUT_FIELD && self.is_scalar() {
            &self.current_output
        } else {
            self.current_output.get(field)?
        };
        Some(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// The terminal outcome of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
    Skipped,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
            Decision::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the reviewer asked for. Maps one-to-one onto [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
    Skip,
}

impl DecisionAction {
    pub fn decision(self) -> Decision {
        match self {
            DecisionAction::Approve => Decision::Approved,
            DecisionAction::Reject => Decision::Rejected,
            DecisionAction::Skip => Decision::Skipped,
        }
    }
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionAction::Approve => write!(f, "approve"),
            DecisionAction::Reject => write!(f, "reject"),
            DecisionAction::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for DecisionAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" | "approved" | "a" => Ok(DecisionAction::Approve),
            "reject" | "rejected" | "r" => Ok(DecisionAction::Reject),
            "skip" | "skipped" | "s" => Ok(DecisionAction::Skip),
            _ => anyhow::bail!(
                "Invalid decision '{}'. Valid values: approve, reject, skip",
                s
            ),
        }
    }
}

/// An immutable entry in the decision ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: Decision,
    pub gavel_id: String,
    pub phase_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    pub original_output: Value,
    /// Reconciled (typed) edits. Fields the reviewer never touched are absent.
    #[serde(default)]
    pub edited_values: Map<String, Value>,
    #[serde(default)]
    pub commentary: String,
    pub timestamp: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(
        decision: Decision,
        request: &ReviewRequest,
        edited_values: Map<String, Value>,
        commentary: &str,
    ) -> Self {
        Self {
            decision,
            gavel_id: request.id.clone(),
            phase_id: request.phase_id.clone(),
            action_id: request.action_id.clone(),
            original_output: request.current_output.clone(),
            edited_values,
            commentary: commentary.trim().to_string(),
            timestamp: Utc::now(),
        }
    }
}
