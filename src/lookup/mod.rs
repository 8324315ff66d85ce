//! Enrichment lookup: finds the leading person for an organization key.
//!
//! Supports:
//! - **Directory**: calls the professional-directory people search directly
//! - **Remote**: asks a search service that speaks the enrichment wire format
//!
//! Both classify provider results into an [`EnrichmentOutcome`]. Failures are
//! reported as [`LookupError`], never folded into `NotFound`.

pub mod directory;
pub mod wire;

pub use directory::DirectoryClient;
pub use wire::{LookupReply, RemoteLookup};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LookupConfig;
use crate::contacts::{CandidatePerson, PersonSummary};
use crate::error::{ConfigError, Error, LookupError};

/// Classified result of looking up one organization key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrichmentOutcome {
    /// The provider confirmed there is no match.
    NotFound,
    /// Exactly one match.
    Single(PersonSummary),
    /// Two or more matches, in provider order.
    Multiple(Vec<CandidatePerson>),
}

impl EnrichmentOutcome {
    /// Classify provider results by count. Order is preserved.
    pub fn classify(mut candidates: Vec<CandidatePerson>) -> Self {
        match candidates.len() {
            0 => Self::NotFound,
            1 => Self::Single(candidates.remove(0).into()),
            _ => Self::Multiple(candidates),
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Single(_) => "single",
            Self::Multiple(_) => "multiple",
        }
    }
}

/// Looks up the leading person at an organization.
#[async_trait]
pub trait EnrichmentLookup: Send + Sync {
    /// Backend name for logging (e.g. "directory", "remote").
    fn name(&self) -> &str;

    /// Look up one organization key.
    async fn lookup(&self, organization_key: &str) -> Result<EnrichmentOutcome, LookupError>;
}

/// Supported lookup backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupBackend {
    Directory,
    Remote,
}

/// Create a lookup from configuration.
pub fn create_lookup(config: &LookupConfig) -> Result<Arc<dyn EnrichmentLookup>, Error> {
    match config.backend() {
        LookupBackend::Directory => {
            let directory = config
                .directory
                .as_ref()
                .ok_or_else(|| ConfigError::MissingEnvVar("DIRECTORY_API_KEY".to_string()))?;
            let client = DirectoryClient::new(directory, config.timeout)?;
            tracing::info!("Using directory lookup (host: {})", directory.host);
            Ok(Arc::new(client))
        }
        LookupBackend::Remote => {
            let url = config
                .remote_url
                .as_deref()
                .ok_or_else(|| ConfigError::MissingEnvVar("ENRICH_LOOKUP_URL".to_string()))?;
            let client = RemoteLookup::new(url, config.timeout)?;
            tracing::info!("Using remote lookup ({})", url);
            Ok(Arc::new(client))
        }
    }
}
