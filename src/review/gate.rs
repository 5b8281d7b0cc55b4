//! The review session state machine.
//!
//! `Idle → Open → Deciding → Idle`. The state slot is the only mutual
//! exclusion the protocol needs: `decide()` moves the session out of the slot
//! before awaiting the engine, so anything arriving meanwhile observes
//! `Deciding` and is turned away.
//!
//! A second `open()` while a review is open or being decided is rejected
//! with [`GateError::SessionActive`]; the first caller's
//! [`PendingDecision`] is left untouched.

use super::dispatcher::DecisionDispatcher;
use super::reconcile::reconcile;
use super::session::{PendingDecision, ReviewSession, Waiter};
use super::{DecisionAction, DecisionRecord, ReviewRequest};
use crate::engine::{EngineEvent, EventBus, OrchestrationEngine, Subscription};
use crate::errors::{GateError, StorageError};
use crate::ledger::{DEFAULT_CAPACITY, DEFAULT_HISTORY_KEY, DecisionLedger};
use crate::storage::KeyValueStore;
use crate::ui::ReviewPresenter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Settings the gate needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Maximum number of decisions kept in history.
    pub history_capacity: usize,
    /// Storage key holding the serialized history.
    pub history_key: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
        }
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Open,
    Deciding,
}

/// Why a `decide()` call did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    NoActiveReview,
    DecisionInProgress,
    SkipNotAllowed,
}

/// Result of a `decide()` call.
#[derive(Debug, Clone, PartialEq)]
pub enum DecideOutcome {
    /// The review closed. `delivered` is false when the engine call failed.
    Decided {
        record: DecisionRecord,
        delivered: bool,
    },
    Ignored(IgnoredReason),
}

impl DecideOutcome {
    pub fn record(&self) -> Option<&DecisionRecord> {
        match self {
            DecideOutcome::Decided { record, .. } => Some(record),
            DecideOutcome::Ignored(_) => None,
        }
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, DecideOutcome::Decided { .. })
    }
}

enum Slot {
    Idle,
    Open(ReviewSession),
    /// The session has been taken by `decide()`; only the request is kept.
    Deciding(ReviewRequest),
}

impl Slot {
    fn state(&self) -> GateState {
        match self {
            Slot::Idle => GateState::Idle,
            Slot::Open(_) => GateState::Open,
            Slot::Deciding(_) => GateState::Deciding,
        }
    }
}

struct Inner {
    initialized: bool,
    slot: Slot,
    ledger: DecisionLedger,
    subscriptions: Vec<Subscription>,
}

/// Human review checkpoint for one pipeline at a time.
///
/// Presenters are called while the gate's lock is held and must not call
/// back into the gate.
pub struct ReviewGate {
    dispatcher: DecisionDispatcher,
    presenter: Option<Arc<dyn ReviewPresenter>>,
    inner: Mutex<Inner>,
}

impl ReviewGate {
    pub fn new(
        engine: Arc<dyn OrchestrationEngine>,
        store: Arc<dyn KeyValueStore>,
        config: GateConfig,
    ) -> Self {
        let ledger = DecisionLedger::new(store, &config.history_key, config.history_capacity);
        Self {
            dispatcher: DecisionDispatcher::new(engine),
            presenter: None,
            inner: Mutex::new(Inner {
                initialized: false,
                slot: Slot::Idle,
                ledger,
                subscriptions: Vec::new(),
            }),
        }
    }

    pub fn with_presenter(mut self, presenter: Arc<dyn ReviewPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load history and accept reviews. Calling it again is a no-op.
    pub fn init(&self) {
        let mut inner = self.lock();
        if inner.initialized {
            return;
        }
        inner.ledger.load();
        inner.initialized = true;
        info!(history = inner.ledger.len(), "Review gate initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn state(&self) -> GateState {
        self.lock().slot.state()
    }

    /// The request under review, including while its decision is in flight.
    pub fn current_request(&self) -> Option<ReviewRequest> {
        match &self.lock().slot {
            Slot::Idle => None,
            Slot::Open(session) => Some(session.request.clone()),
            Slot::Deciding(request) => Some(request.clone()),
        }
    }

    /// Open a review. The returned future completes when the review is decided.
    pub fn open(&self, request: ReviewRequest) -> Result<PendingDecision, GateError> {
        let mut inner = self.lock();
        if !inner.initialized {
            warn!(gavel_id = %request.id, "Review requested before the gate was initialized");
            return Err(GateError::NotInitialized);
        }

        let active = match &inner.slot {
            Slot::Idle => None,
            Slot::Open(session) => Some(session.request.id.clone()),
            Slot::Deciding(request) => Some(request.id.clone()),
        };
        if let Some(active) = active {
            warn!(active = %active, rejected = %request.id, "Review already open; rejecting new request");
            return Err(GateError::SessionActive {
                active,
                rejected: request.id,
            });
        }

        let (waiter, pending) = Waiter::pair(&request.id);
        info!(gavel_id = %request.id, phase_id = %request.phase_id, "Review opened");
        let session = ReviewSession::new(request, waiter);
        if let Some(presenter) = &self.presenter {
            presenter.show(session.view());
        }
        inner.slot = Slot::Open(session);
        Ok(pending)
    }

    /// Replace the raw text of an editable field.
    ///
    /// Returns `false` when no review is open or the field is not editable.
    pub fn set_edited_value(&self, field: &str, raw: &str) -> bool {
        let mut inner = self.lock();
        let Slot::Open(session) = &mut inner.slot else {
            debug!(field, "Edit ignored: no open review");
            return false;
        };
        let accepted = session.set_edited_value(field, raw);
        if !accepted {
            debug!(gavel_id = %session.request.id, field, "Edit ignored: field is not editable");
        }
        accepted
    }

    /// Replace the reviewer commentary. Returns `false` when no review is open.
    pub fn set_commentary(&self, text: &str) -> bool {
        let mut inner = self.lock();
        match &mut inner.slot {
            Slot::Open(session) => {
                session.set_commentary(text);
                true
            }
            _ => {
                debug!("Commentary ignored: no open review");
                false
            }
        }
    }

    /// Close the open review with `action`.
    ///
    /// Order of effects: one engine call, one history append, one waiter
    /// resolution. Engine and storage failures are logged and do not stop
    /// the later steps.
    pub async fn decide(&self, action: DecisionAction) -> DecideOutcome {
        let session = {
            let mut inner = self.lock();
            match std::mem::replace(&mut inner.slot, Slot::Idle) {
                Slot::Open(session) => {
                    if action == DecisionAction::Skip && !session.request.can_skip {
                        debug!(gavel_id = %session.request.id, "Skip ignored: review cannot be skipped");
                        inner.slot = Slot::Open(session);
                        return DecideOutcome::Ignored(IgnoredReason::SkipNotAllowed);
                    }
                    inner.slot = Slot::Deciding(session.request.clone());
                    session
                }
                other => {
                    let reason = match other {
                        Slot::Deciding(_) => IgnoredReason::DecisionInProgress,
                        _ => IgnoredReason::NoActiveReview,
                    };
                    debug!(%action, ?reason, "Decision ignored");
                    inner.slot = other;
                    return DecideOutcome::Ignored(reason);
                }
            }
        };

        let gavel_id = session.request.id.clone();
        let mut guard = DecidingGuard {
            gate: self,
            gavel_id: &gavel_id,
            armed: true,
        };

        let decision = action.decision();
        let reconciled = reconcile(&session.request, &session.edited_values);
        if !reconciled.fallbacks.is_empty() {
            debug!(gavel_id = %gavel_id, fields = ?reconciled.fallbacks, "Kept raw text for unparseable edits");
        }

        let delivered = self
            .dispatcher
            .dispatch(decision, &session.request, &reconciled, &session.commentary)
            .await;

        let ReviewSession {
            request,
            commentary,
            waiter,
            ..
        } = session;
        let record = DecisionRecord::new(decision, &request, reconciled.values, &commentary);

        {
            let mut inner = self.lock();
            if let Err(e) = inner.ledger.append(record.clone()) {
                error!(gavel_id = %gavel_id, error = %e, "Failed to persist decision history");
            }
            if matches!(&inner.slot, Slot::Deciding(r) if r.id == gavel_id) {
                inner.slot = Slot::Idle;
            }
        }
        guard.armed = false;

        if let Some(presenter) = &self.presenter {
            presenter.hide();
        }

        if !waiter.resolve(record.clone()) {
            debug!(gavel_id = %gavel_id, "Review caller stopped waiting before the decision");
        }
        info!(gavel_id = %gavel_id, %decision, delivered, "Review closed");

        DecideOutcome::Decided { record, delivered }
    }

    pub async fn approve_current(&self) -> DecideOutcome {
        self.decide(DecisionAction::Approve).await
    }

    pub async fn reject_current(&self) -> DecideOutcome {
        self.decide(DecisionAction::Reject).await
    }

    pub async fn skip_current(&self) -> DecideOutcome {
        self.decide(DecisionAction::Skip).await
    }

    /// Past decisions, newest first.
    pub fn history(&self) -> Vec<DecisionRecord> {
        self.lock().ledger.list()
    }

    pub fn clear_history(&self) -> Result<(), StorageError> {
        self.lock().ledger.clear()
    }

    /// Open a review for every `ReviewRequested` event on `bus`.
    ///
    /// The subscription is owned by the gate and released by `destroy()`.
    /// Must be called inside a Tokio runtime.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        let gate = Arc::downgrade(self);
        let subscription = bus.subscribe(move |event| {
            let Some(gate) = gate.upgrade() else {
                return;
            };
            match event {
                EngineEvent::ReviewRequested(request) => {
                    let gavel_id = request.id.clone();
                    match gate.open(request) {
                        Ok(pending) => {
                            tokio::spawn(async move {
                                let gavel_id = pending.gavel_id().to_string();
                                match pending.await {
                                    Ok(record) => {
                                        debug!(gavel_id = %gavel_id, decision = %record.decision, "Engine-requested review resolved")
                                    }
                                    Err(e) => debug!(gavel_id = %gavel_id, error = %e, "Engine-requested review ended"),
                                }
                            });
                        }
                        Err(e) => warn!(gavel_id = %gavel_id, error = %e, "Could not open engine-requested review"),
                    }
                }
            }
        });
        self.lock().subscriptions.push(subscription);
    }

    /// Tear down: drop subscriptions, abandon any open review and stop
    /// accepting new ones. Safe to call more than once.
    ///
    /// A decision already in flight still completes and resolves its caller.
    pub fn destroy(&self) {
        let (subscriptions, abandoned) = {
            let mut inner = self.lock();
            inner.initialized = false;
            let subscriptions = std::mem::take(&mut inner.subscriptions);
            let abandoned = match std::mem::replace(&mut inner.slot, Slot::Idle) {
                Slot::Open(session) => Some(session),
                other => {
                    inner.slot = other;
                    None
                }
            };
            (subscriptions, abandoned)
        };

        let active = subscriptions.iter().filter(|s| s.is_active()).count();
        if active > 0 {
            debug!(subscriptions = active, "Releasing engine event subscriptions");
        }
        drop(subscriptions);
        if let Some(session) = abandoned {
            warn!(gavel_id = %session.request.id, "Review abandoned by gate shutdown");
            drop(session);
            if let Some(presenter) = &self.presenter {
                presenter.hide();
            }
        }
        debug!("Review gate destroyed");
    }
}

impl Drop for ReviewGate {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Returns the slot to `Idle` if a `decide()` future is dropped mid-flight.
///
/// The session (and its waiter) is dropped with the future, so the caller
/// observes an abandoned review.
struct DecidingGuard<'a> {
    gate: &'a ReviewGate,
    gavel_id: &'a str,
    armed: bool,
}

impl Drop for DecidingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.gate.lock();
        if matches!(&inner.slot, Slot::Deciding(r) if r.id == self.gavel_id) {
            warn!(gavel_id = %self.gavel_id, "Decision cancelled before completion; review abandoned");
            inner.slot = Slot::Idle;
        }
    }
}
