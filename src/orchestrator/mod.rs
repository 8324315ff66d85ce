//! Enrichment orchestrator: walks contacts in order, one lookup at a time.
//!
//! Flow per contact:
//! 1. Derive the organization key
//! 2. Look it up
//! 3. NotFound / Single / failure → settle the contact and move on
//! 4. Multiple → present candidates to the gate and wait for the operator
//!
//! A pending disambiguation blocks every later contact. Observers read
//! progress through a [`ProgressWatch`]; nothing but the orchestrator mutates
//! the state.

pub mod state;

pub use state::{OrchestratorState, Phase, ProgressSnapshot, Transition};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::contacts::{CandidatePerson, ContactSeed};
use crate::error::{GateError, OrchestratorError};
use crate::gate::{DisambiguationGate, SelectionTicket};
use crate::lookup::EnrichmentLookup;

/// How a call to [`Orchestrator::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every contact was processed.
    Completed,
    /// The gate gave up on a pending selection; the run can be resumed.
    Suspended,
}

/// Pull-based view of a run's progress.
#[derive(Debug, Clone)]
pub struct ProgressWatch {
    rx: watch::Receiver<ProgressSnapshot>,
}

impl ProgressWatch {
    /// The latest snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next change. `None` once the orchestrator is dropped.
    pub async fn changed(&mut self) -> Option<ProgressSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Drives an [`OrchestratorState`] against a lookup and a gate.
pub struct Orchestrator {
    lookup: Arc<dyn EnrichmentLookup>,
    gate: Arc<dyn DisambiguationGate>,
    state: OrchestratorState,
    progress_tx: watch::Sender<ProgressSnapshot>,
}

impl Orchestrator {
    /// Create an orchestrator over fresh contact seeds.
    pub fn new(
        seeds: Vec<ContactSeed>,
        lookup: Arc<dyn EnrichmentLookup>,
        gate: Arc<dyn DisambiguationGate>,
    ) -> Self {
        Self::with_state(OrchestratorState::new(seeds), lookup, gate)
    }

    /// Resume driving an existing state (e.g. one that was suspended).
    pub fn with_state(
        state: OrchestratorState,
        lookup: Arc<dyn EnrichmentLookup>,
        gate: Arc<dyn DisambiguationGate>,
    ) -> Self {
        let (progress_tx, _rx) = watch::channel(state.snapshot());
        Self {
            lookup,
            gate,
            state,
            progress_tx,
        }
    }

    /// Subscribe to progress snapshots.
    pub fn watch(&self) -> ProgressWatch {
        ProgressWatch {
            rx: self.progress_tx.subscribe(),
        }
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn into_state(self) -> OrchestratorState {
        self.state
    }

    /// Apply an operator decision made outside the gate, e.g. after the
    /// run returned `Suspended`.
    pub fn resolve_selection(
        &mut self,
        ticket: SelectionTicket,
        chosen: CandidatePerson,
    ) -> Result<Transition, OrchestratorError> {
        let transition = self.state.resolve_selection(ticket, chosen)?;
        self.publish();
        Ok(transition)
    }

    /// Process contacts until the run completes or the gate gives up.
    ///
    /// Lookup failures never end the run. Only broken state invariants
    /// surface as `OrchestratorError`.
    pub async fn run(&mut self) -> Result<RunOutcome, OrchestratorError> {
        loop {
            match self.state.phase() {
                Phase::Idle => {
                    self.state.start()?;
                    info!(
                        run_id = %self.state.run_id(),
                        contacts = self.state.contacts().len(),
                        lookup = self.lookup.name(),
                        gate = self.gate.name(),
                        "Enrichment run started"
                    );
                    self.publish();
                }
                Phase::Running => self.step().await?,
                Phase::AwaitingSelection => {
                    if !self.await_selection().await? {
                        return Ok(RunOutcome::Suspended);
                    }
                }
                Phase::Completed => {
                    let enriched = self
                        .state
                        .contacts()
                        .iter()
                        .filter(|c| c.summary.is_some())
                        .count();
                    info!(
                        run_id = %self.state.run_id(),
                        enriched,
                        total = self.state.contacts().len(),
                        "Enrichment run complete"
                    );
                    return Ok(RunOutcome::Completed);
                }
            }
        }
    }

    /// Look up the contact at the cursor and record the result.
    async fn step(&mut self) -> Result<(), OrchestratorError> {
        let Some(key) = self.state.begin_lookup() else {
            return Ok(());
        };
        self.publish();

        let cursor = self.state.cursor();
        let email = self.state.contacts()[cursor].seed.email.clone();
        debug!(cursor, contact = %email, organization_key = %key, "Looking up organization");

        let result = self.lookup.lookup(&key).await;
        match &result {
            Ok(outcome) => debug!(
                cursor,
                organization_key = %key,
                outcome = outcome.label(),
                "Lookup finished"
            ),
            Err(e) => warn!(
                cursor,
                contact = %email,
                organization_key = %key,
                error = %e,
                "Lookup failed, skipping contact"
            ),
        }

        self.state.record_outcome(result)?;
        self.publish();
        Ok(())
    }

    /// Present the pending candidates. Returns `false` if the run should suspend.
    async fn await_selection(&mut self) -> Result<bool, OrchestratorError> {
        let request = self
            .state
            .pending()
            .cloned()
            .ok_or(OrchestratorError::StaleSelection)?;
        let ticket = request.ticket;

        match self.gate.present(request).await {
            Ok(chosen) => match self.state.resolve_selection(ticket, chosen) {
                Ok(_) => {
                    self.publish();
                    Ok(true)
                }
                Err(OrchestratorError::UnknownCandidate { name }) => {
                    warn!(
                        ticket = %ticket,
                        candidate = %name,
                        "Gate chose a candidate that was not offered, run suspended"
                    );
                    Ok(false)
                }
                Err(e) => Err(e),
            },
            Err(GateError::Abandoned) => {
                info!(ticket = %ticket, "Selection abandoned, run suspended");
                Ok(false)
            }
            Err(e) => {
                warn!(ticket = %ticket, error = %e, "Gate failed, run suspended");
                Ok(false)
            }
        }
    }

    fn publish(&self) {
        self.progress_tx.send_replace(self.state.snapshot());
    }
}
