//! Enrichment wire format and the remote search-service client.
//!
//! ```json
//! { "outcome": "not_found" }
//! { "outcome": "single", "person": { "name": "...", "title": "..." } }
//! { "outcome": "multiple", "candidates": [ { "name": "..." }, ... ] }
//! { "outcome": "error", "detail": "..." }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EnrichmentLookup, EnrichmentOutcome};
use crate::contacts::{CandidatePerson, PersonSummary};
use crate::error::LookupError;

const PROVIDER: &str = "remote";

/// Body of a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub company: String,
}

/// Enrichment reply on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupReply {
    NotFound,
    Single { person: PersonSummary },
    Multiple { candidates: Vec<CandidatePerson> },
    Error { detail: String },
}

impl LookupReply {
    /// Convert back into a lookup result.
    ///
    /// A `multiple` reply with fewer than two candidates is malformed.
    pub fn into_outcome(self) -> Result<EnrichmentOutcome, LookupError> {
        match self {
            Self::NotFound => Ok(EnrichmentOutcome::NotFound),
            Self::Single { person } => Ok(EnrichmentOutcome::Single(person)),
            Self::Multiple { candidates } if candidates.len() >= 2 => {
                Ok(EnrichmentOutcome::Multiple(candidates))
            }
            Self::Multiple { candidates } => Err(LookupError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: format!(
                    "multiple outcome with {} candidate(s)",
                    candidates.len()
                ),
            }),
            Self::Error { detail } => Err(LookupError::Rejected {
                provider: PROVIDER.to_string(),
                message: detail,
            }),
        }
    }
}

impl From<Result<EnrichmentOutcome, LookupError>> for LookupReply {
    fn from(result: Result<EnrichmentOutcome, LookupError>) -> Self {
        match result {
            Ok(EnrichmentOutcome::NotFound) => Self::NotFound,
            Ok(EnrichmentOutcome::Single(person)) => Self::Single { person },
            Ok(EnrichmentOutcome::Multiple(candidates)) => Self::Multiple { candidates },
            Err(e) => Self::Error {
                detail: e.to_string(),
            },
        }
    }
}

/// Client for a search service answering `POST {url} {"company": key}`.
pub struct RemoteLookup {
    client: reqwest::Client,
    url: String,
}

impl RemoteLookup {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl EnrichmentLookup for RemoteLookup {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lookup(&self, organization_key: &str) -> Result<EnrichmentOutcome, LookupError> {
        let body = SearchRequest {
            company: organization_key.to_string(),
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LookupError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let reply: LookupReply = resp.json().await.map_err(|e| LookupError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

        reply.into_outcome()
    }
}
