//! The open review and the single-slot waiter that hands its result back.

use super::{DecisionRecord, ReviewRequest};
use crate::errors::GateError;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Single-use continuation for the caller that opened a review.
///
/// A gate holds at most one waiter. It is consumed by [`Waiter::resolve`];
/// dropping it unresolved marks the review abandoned for the caller.
#[derive(Debug)]
pub struct Waiter {
    tx: oneshot::Sender<DecisionRecord>,
}

impl Waiter {
    /// Create a waiter and the future its caller awaits.
    pub fn pair(gavel_id: &str) -> (Waiter, PendingDecision) {
        let (tx, rx) = oneshot::channel();
        (
            Waiter { tx },
            PendingDecision {
                gavel_id: gavel_id.to_string(),
                rx,
            },
        )
    }

    /// Hand the record to the caller. Returns `false` if the caller stopped waiting.
    pub fn resolve(self, record: DecisionRecord) -> bool {
        self.tx.send(record).is_ok()
    }
}

/// Completes with the decision once the review resolves, or with
/// [`GateError::Abandoned`] if the gate was destroyed first.
#[derive(Debug)]
pub struct PendingDecision {
    gavel_id: String,
    rx: oneshot::Receiver<DecisionRecord>,
}

impl PendingDecision {
    pub fn gavel_id(&self) -> &str {
        &self.gavel_id
    }
}

impl Future for PendingDecision {
    type Output = Result<DecisionRecord, GateError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let polled = Pin::new(&mut self.rx).poll(cx);
        polled.map(|result| {
            result.map_err(|_| GateError::Abandoned {
                gavel_id: self.gavel_id.clone(),
            })
        })
    }
}

/// State of the review currently open at the gate.
#[derive(Debug)]
pub struct ReviewSession {
    pub request: ReviewRequest,
    /// Raw text per touched field.
    pub edited_values: BTreeMap<String, String>,
    pub commentary: String,
    pub(crate) waiter: Waiter,
}

impl ReviewSession {
    pub fn new(request: ReviewRequest, waiter: Waiter) -> Self {
        Self {
            request,
            edited_values: BTreeMap::new(),
            commentary: String::new(),
            waiter,
        }
    }

    /// Record a raw edit. Returns `false` (and changes nothing) for fields the
    /// request does not mark editable.
    pub fn set_edited_value(&mut self, field: &str, raw: &str) -> bool {
        if !self.request.is_editable(field) {
            return false;
        }
        self.edited_values.insert(field.to_string(), raw.to_string());
        true
    }

    pub fn set_commentary(&mut self, text: &str) {
        self.commentary = text.to_string();
    }

    /// Read-only view for presenters.
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            request: &self.request,
            edited_values: &self.edited_values,
            commentary: &self.commentary,
        }
    }
}

/// Borrowed snapshot of a session handed to presenters.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub request: &'a ReviewRequest,
    pub edited_values: &'a BTreeMap<String, String>,
    pub commentary: &'a str,
}
