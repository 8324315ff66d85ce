//! Orchestrator state machine.
//!
//! Idle → Running ⇄ AwaitingSelection → Completed.
//!
//! Invariants:
//! - `cursor` never decreases and only moves while Running.
//! - Every contact before `cursor` is settled and is never visited again.
//! - AwaitingSelection holds exactly one pending request, addressed to
//!   `contacts[cursor]`.
//! - Progress is always `cursor / total`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contacts::{
    CandidatePerson, ContactSeed, ContactStatus, EnrichedContact, derive_key,
};
use crate::error::{LookupError, OrchestratorError};
use crate::gate::{DisambiguationRequest, SelectionTicket};
use crate::lookup::EnrichmentOutcome;

/// Orchestrator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    AwaitingSelection,
    Completed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::AwaitingSelection => "awaiting_selection",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// What a transition left the state in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Cursor moved on; more contacts remain.
    Advanced,
    /// The current contact needs an operator decision.
    AwaitingSelection(DisambiguationRequest),
    /// Cursor passed the last contact.
    Completed,
}

/// Read-only view of a run for observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub run_id: Uuid,
    pub processed_count: usize,
    pub total_count: usize,
    pub current_organization_key: Option<String>,
    pub phase: Phase,
    /// `processed_count / total_count`, 1.0 once an empty run completes.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<DisambiguationRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressSnapshot {
    /// Progress as a whole percentage.
    pub fn percent(&self) -> u8 {
        (self.progress * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// The full state of one enrichment run. Owned by a single orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorState {
    run_id: Uuid,
    contacts: Vec<EnrichedContact>,
    cursor: usize,
    phase: Phase,
    current_key: Option<String>,
    pending: Option<DisambiguationRequest>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl OrchestratorState {
    /// Fresh, idle state over the given seeds.
    pub fn new(seeds: Vec<ContactSeed>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            contacts: seeds.into_iter().map(EnrichedContact::from).collect(),
            cursor: 0,
            phase: Phase::Idle,
            current_key: None,
            pending: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn contacts(&self) -> &[EnrichedContact] {
        &self.contacts
    }

    pub fn into_contacts(self) -> Vec<EnrichedContact> {
        self.contacts
    }

    pub fn pending(&self) -> Option<&DisambiguationRequest> {
        self.pending.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Fraction of contacts processed.
    pub fn progress(&self) -> f64 {
        if self.contacts.is_empty() {
            return if self.phase == Phase::Completed { 1.0 } else { 0.0 };
        }
        self.cursor as f64 / self.contacts.len() as f64
    }

    /// Observable snapshot of the run.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            run_id: self.run_id,
            processed_count: self.cursor,
            total_count: self.contacts.len(),
            current_organization_key: self.current_key.clone(),
            phase: self.phase,
            progress: self.progress(),
            pending: self.pending.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    /// Idle → Running (or straight to Completed when there is nothing to do).
    pub fn start(&mut self) -> Result<Transition, OrchestratorError> {
        if self.phase != Phase::Idle {
            return Err(OrchestratorError::InvalidTransition {
                phase: self.phase,
                action: "start",
            });
        }
        self.started_at = Some(Utc::now());
        self.phase = Phase::Running;
        if self.contacts.is_empty() {
            self.finish();
            return Ok(Transition::Completed);
        }
        Ok(Transition::Advanced)
    }

    /// Derive the organization key for the contact at the cursor.
    ///
    /// Returns `None` unless Running with contacts remaining.
    pub fn begin_lookup(&mut self) -> Option<String> {
        if self.phase != Phase::Running {
            return None;
        }
        let contact = self.contacts.get(self.cursor)?;
        let key = derive_key(&contact.seed.email);
        self.current_key = Some(key.clone());
        Some(key)
    }

    /// Apply the lookup result for the contact at the cursor.
    pub fn record_outcome(
        &mut self,
        result: Result<EnrichmentOutcome, LookupError>,
    ) -> Result<Transition, OrchestratorError> {
        match self.phase {
            Phase::Running => {}
            Phase::AwaitingSelection => {
                return Err(OrchestratorError::SelectionOutstanding {
                    cursor: self.cursor,
                });
            }
            phase => {
                return Err(OrchestratorError::InvalidTransition {
                    phase,
                    action: "record a lookup outcome",
                });
            }
        }

        let cursor = self.cursor;
        let key = match &self.current_key {
            Some(key) => key.clone(),
            None => derive_key(&self.contacts[cursor].seed.email),
        };

        match result {
            Ok(EnrichmentOutcome::NotFound) => {
                self.contacts[cursor].status = ContactStatus::NotFound;
                Ok(self.advance())
            }
            Ok(EnrichmentOutcome::Single(person)) => {
                let contact = &mut self.contacts[cursor];
                contact.summary = Some(person);
                contact.status = ContactStatus::Matched;
                Ok(self.advance())
            }
            Ok(EnrichmentOutcome::Multiple(candidates)) => {
                let request = DisambiguationRequest {
                    ticket: SelectionTicket {
                        run_id: self.run_id,
                        cursor,
                    },
                    contact: self.contacts[cursor].seed.clone(),
                    organization_key: key,
                    candidates,
                };
                self.pending = Some(request.clone());
                self.phase = Phase::AwaitingSelection;
                Ok(Transition::AwaitingSelection(request))
            }
            Err(e) => {
                self.contacts[cursor].status = ContactStatus::Failed {
                    detail: e.to_string(),
                };
                Ok(self.advance())
            }
        }
    }

    /// Resolve the pending disambiguation with the operator's choice.
    pub fn resolve_selection(
        &mut self,
        ticket: SelectionTicket,
        chosen: CandidatePerson,
    ) -> Result<Transition, OrchestratorError> {
        if self.phase != Phase::AwaitingSelection {
            return Err(OrchestratorError::StaleSelection);
        }
        let pending = self
            .pending
            .as_ref()
            .ok_or(OrchestratorError::StaleSelection)?;
        if pending.ticket != ticket {
            return Err(OrchestratorError::StaleSelection);
        }
        if !pending.candidates.contains(&chosen) {
            return Err(OrchestratorError::UnknownCandidate { name: chosen.name });
        }

        self.pending = None;
        let contact = &mut self.contacts[self.cursor];
        contact.summary = Some(chosen.into());
        contact.status = ContactStatus::Selected;
        self.phase = Phase::Running;
        Ok(self.advance())
    }

    fn advance(&mut self) -> Transition {
        self.cursor += 1;
        if self.cursor >= self.contacts.len() {
            self.finish();
            Transition::Completed
        } else {
            Transition::Advanced
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Completed;
        self.current_key = None;
        self.completed_at = Some(Utc::now());
    }
}
