//! Error types for contact enrichment.

use crate::orchestrator::state::Phase;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Enrichment lookup failures.
///
/// Every variant means "could not determine". A confirmed absence is
/// `EnrichmentOutcome::NotFound`, never one of these.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned status {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} rejected the search: {message}")]
    Rejected { provider: String, message: String },
}

/// Disambiguation gate errors.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Operator abandoned the selection")]
    Abandoned,

    #[error("A selection is already outstanding")]
    Busy,

    #[error("No pending selection")]
    NoPendingSelection,

    #[error("Selection ticket does not match the pending selection")]
    TicketMismatch,

    #[error("Invalid choice {index}: {available} candidates available")]
    InvalidChoice { index: usize, available: usize },

    #[error("The run awaiting this selection is gone")]
    Stale,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Orchestrator contract violations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Cannot {action} while {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },

    #[error("A disambiguation is already pending for contact {cursor}")]
    SelectionOutstanding { cursor: usize },

    #[error("Selection does not address the pending disambiguation")]
    StaleSelection,

    #[error("Chosen candidate {name:?} is not among the pending candidates")]
    UnknownCandidate { name: String },
}

/// Report export errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
