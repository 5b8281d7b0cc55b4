//! Forwards a finalized decision to the orchestration engine.

use super::{Decision, Reconciled, ReviewRequest};
use crate::engine::{Modifications, OrchestrationEngine};
use std::sync::Arc;
use tracing::{error, info};

/// Translates a decision into exactly one engine call.
#[derive(Clone)]
pub struct DecisionDispatcher {
    engine: Arc<dyn OrchestrationEngine>,
}

impl DecisionDispatcher {
    pub fn new(engine: Arc<dyn OrchestrationEngine>) -> Self {
        Self { engine }
    }

    /// Build the approval payload from reconciled edits and commentary.
    pub fn modifications(reconciled: &Reconciled, commentary: &str) -> Modifications {
        Modifications {
            edited_values: if reconciled.is_empty() {
                None
            } else {
                Some(reconciled.values.clone())
            },
            commentary: commentary.trim().to_string(),
            new_output: reconciled.replacement_output.clone(),
        }
    }

    /// Call the engine entry point matching `decision`.
    ///
    /// Returns whether the engine accepted the call. Failures are logged and
    /// never propagated.
    pub async fn dispatch(
        &self,
        decision: Decision,
        request: &ReviewRequest,
        reconciled: &Reconciled,
        commentary: &str,
    ) -> bool {
        let gavel_id = request.id.as_str();
        let result = match decision {
            Decision::Approved => {
                let modifications = Self::modifications(reconciled, commentary);
                self.engine.approve(gavel_id, &modifications).await
            }
            Decision::Rejected => self.engine.reject(gavel_id, commentary.trim()).await,
            Decision::Skipped => self.engine.skip(gavel_id).await,
        };

        match result {
            Ok(()) => {
                info!(gavel_id, phase_id = %request.phase_id, %decision, "Decision delivered to engine");
                true
            }
            Err(e) => {
                error!(
                    gavel_id,
                    phase_id = %request.phase_id,
                    %decision,
                    error = %format!("{:#}", e),
                    "Engine rejected review decision"
                );
                false
            }
        }
    }
}
