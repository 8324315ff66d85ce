//! Disambiguation gate: asks a human to pick one of several candidates.
//!
//! A gate receives a [`DisambiguationRequest`] and eventually yields one
//! chosen candidate. It may also never yield: the orchestrator imposes no
//! timeout and stays suspended until the operator acts. Only one
//! presentation is outstanding at a time.

pub mod cli;
pub mod desk;

pub use cli::CliGate;
pub use desk::OperatorDesk;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contacts::{CandidatePerson, ContactSeed};
use crate::error::GateError;

/// Addresses one pending disambiguation: a specific contact in a specific run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTicket {
    pub run_id: Uuid,
    pub cursor: usize,
}

impl std::fmt::Display for SelectionTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.run_id, self.cursor)
    }
}

/// What the operator is asked to decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisambiguationRequest {
    pub ticket: SelectionTicket,
    /// The contact being enriched.
    pub contact: ContactSeed,
    pub organization_key: String,
    /// Candidates in provider order.
    pub candidates: Vec<CandidatePerson>,
}

/// Presents candidates to an operator and returns their choice.
#[async_trait]
pub trait DisambiguationGate: Send + Sync {
    /// Gate name for logging (e.g. "cli", "desk").
    fn name(&self) -> &str;

    /// Wait for the operator to choose one candidate.
    ///
    /// Returns `GateError::Abandoned` when the operator can no longer answer
    /// (closed terminal, explicit abandon). Never times out on its own.
    async fn present(&self, request: DisambiguationRequest) -> Result<CandidatePerson, GateError>;
}
