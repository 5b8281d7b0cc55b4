//! The orchestration engine as seen from the review gate.
//!
//! Outbound: the gate forwards each decision through [`OrchestrationEngine`].
//! Inbound: the engine publishes [`EngineEvent`]s on an [`EventBus`]; the gate
//! subscribes and opens a review for every `ReviewRequested` event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod events;
pub use events::{EngineEvent, EventBus, Subscription};

/// Changes a reviewer attached to an approval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modifications {
    /// Reconciled edits, `None` when the reviewer changed nothing.
    pub edited_values: Option<Map<String, Value>>,
    pub commentary: String,
    /// Replacement for a scalar output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_output: Option<String>,
}

/// Decision entry points of the orchestration engine.
///
/// Calls are fire-and-forget from the gate's perspective: an `Err` is logged
/// and otherwise ignored.
#[async_trait]
pub trait OrchestrationEngine: Send + Sync {
    async fn approve(&self, gavel_id: &str, modifications: &Modifications) -> anyhow::Result<()>;

    async fn reject(&self, gavel_id: &str, commentary: &str) -> anyhow::Result<()>;

    async fn skip(&self, gavel_id: &str) -> anyhow::Result<()>;
}

/// One call made against an engine, as captured by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "lowercase")]
pub enum EngineCall {
    Approve {
        gavel_id: String,
        modifications: Modifications,
    },
    Reject {
        gavel_id: String,
        commentary: String,
    },
    Skip {
        gavel_id: String,
    },
}

impl EngineCall {
    pub fn gavel_id(&self) -> &str {
        match self {
            EngineCall::Approve { gavel_id, .. }
            | EngineCall::Reject { gavel_id, .. }
            | EngineCall::Skip { gavel_id } => gavel_id,
        }
    }
}

/// Engine that records every call and can be told to fail.
///
/// Used by the CLI (which prints the calls) and by tests.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: std::sync::Mutex<Vec<EngineCall>>,
    fail_with: Option<String>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose every call records and then returns an error.
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Default::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: EngineCall) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
        match &self.fail_with {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OrchestrationEngine for RecordingEngine {
    async fn approve(&self, gavel_id: &str, modifications: &Modifications) -> anyhow::Result<()> {
        self.record(EngineCall::Approve {
            gavel_id: gavel_id.to_string(),
            modifications: modifications.clone(),
        })
    }

    async fn reject(&self, gavel_id: &str, commentary: &str) -> anyhow::Result<()> {
        self.record(EngineCall::Reject {
            gavel_id: gavel_id.to_string(),
            commentary: commentary.to_string(),
        })
    }

    async fn skip(&self, gavel_id: &str) -> anyhow::Result<()> {
        self.record(EngineCall::Skip {
            gavel_id: gavel_id.to_string(),
        })
    }
}
