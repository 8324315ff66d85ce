//! Operator desk: an in-process gate resolved by an outside caller.
//!
//! `present()` parks the request on the desk and waits on a oneshot. The HTTP
//! surface (or a test) reads the pending request and calls `select()` with the
//! request's ticket. A selection for a ticket that is no longer pending, or
//! whose run has gone away, is refused and changes nothing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot, watch};
use tracing::{debug, info, warn};

use super::{DisambiguationGate, DisambiguationRequest, SelectionTicket};
use crate::contacts::CandidatePerson;
use crate::error::GateError;

/// The presentation currently waiting for an answer.
struct Outstanding {
    ticket: SelectionTicket,
    candidates: Vec<CandidatePerson>,
    responder: oneshot::Sender<CandidatePerson>,
}

/// In-process disambiguation gate.
pub struct OperatorDesk {
    outstanding: Mutex<Option<Outstanding>>,
    pending_tx: watch::Sender<Option<DisambiguationRequest>>,
}

impl OperatorDesk {
    /// Create an empty desk.
    pub fn new() -> Arc<Self> {
        let (pending_tx, _rx) = watch::channel(None);
        Arc::new(Self {
            outstanding: Mutex::new(None),
            pending_tx,
        })
    }

    /// The request awaiting a decision, if its run is still waiting.
    pub async fn pending(&self) -> Option<DisambiguationRequest> {
        let slot = self.outstanding.lock().await;
        match slot.as_ref() {
            Some(o) if !o.responder.is_closed() => self.pending_tx.borrow().clone(),
            _ => None,
        }
    }

    /// Wait until a live request is presented and return it.
    ///
    /// Presentations left behind by a dropped run are skipped.
    pub async fn next_request(&self) -> Option<DisambiguationRequest> {
        let mut rx = self.pending_tx.subscribe();
        loop {
            let presented = rx.borrow_and_update().is_some();
            if presented {
                if let Some(request) = self.pending().await {
                    return Some(request);
                }
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Choose candidate `index` (0-based) for the pending request.
    pub async fn select(
        &self,
        ticket: SelectionTicket,
        index: usize,
    ) -> Result<CandidatePerson, GateError> {
        let mut slot = self.outstanding.lock().await;
        let outstanding = slot.take().ok_or(GateError::NoPendingSelection)?;

        if outstanding.ticket != ticket {
            warn!(expected = %outstanding.ticket, got = %ticket, "Selection ticket mismatch");
            *slot = Some(outstanding);
            return Err(GateError::TicketMismatch);
        }

        let Some(candidate) = outstanding.candidates.get(index).cloned() else {
            let available = outstanding.candidates.len();
            *slot = Some(outstanding);
            return Err(GateError::InvalidChoice { index, available });
        };

        self.pending_tx.send_replace(None);

        if outstanding.responder.send(candidate.clone()).is_err() {
            debug!(ticket = %ticket, "Selection arrived after its run was dropped");
            return Err(GateError::Stale);
        }

        info!(ticket = %ticket, candidate = %candidate.name, "Candidate selected");
        Ok(candidate)
    }

    /// Give up on the pending request. The waiting run suspends.
    pub async fn abandon(&self) -> Result<(), GateError> {
        let mut slot = self.outstanding.lock().await;
        let outstanding = slot.take().ok_or(GateError::NoPendingSelection)?;
        self.pending_tx.send_replace(None);

        if outstanding.responder.is_closed() {
            debug!(ticket = %outstanding.ticket, "Abandon arrived after its run was dropped");
            return Err(GateError::Stale);
        }

        info!(ticket = %outstanding.ticket, "Selection abandoned");
        Ok(())
    }
}

#[async_trait]
impl DisambiguationGate for OperatorDesk {
    fn name(&self) -> &str {
        "desk"
    }

    async fn present(&self, request: DisambiguationRequest) -> Result<CandidatePerson, GateError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = self.outstanding.lock().await;
            if let Some(existing) = slot.as_ref() {
                if !existing.responder.is_closed() {
                    return Err(GateError::Busy);
                }
                debug!(ticket = %existing.ticket, "Replacing presentation left by a dropped run");
            }
            *slot = Some(Outstanding {
                ticket: request.ticket,
                candidates: request.candidates.clone(),
                responder: tx,
            });
        }

        info!(
            ticket = %request.ticket,
            organization_key = %request.organization_key,
            candidates = request.candidates.len(),
            "Awaiting operator selection"
        );
        self.pending_tx.send_replace(Some(request));

        rx.await.map_err(|_| GateError::Abandoned)
    }
}
