//! Directory client: people search against the professional-directory API.
//!
//! `GET {base}/search-people?keywords=<key>&start=0` with RapidAPI-style
//! `x-rapidapi-key` / `x-rapidapi-host` headers.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{EnrichmentLookup, EnrichmentOutcome};
use crate::config::DirectoryConfig;
use crate::contacts::CandidatePerson;
use crate::error::LookupError;

const PROVIDER: &str = "directory";

/// Raw people-search response envelope.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    success: bool,
    #[serde(default)]
    message: String,
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    full_name: String,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, rename = "profileURL")]
    profile_url: Option<String>,
    #[serde(default)]
    profile_picture: Option<String>,
}

impl From<SearchItem> for CandidatePerson {
    fn from(item: SearchItem) -> Self {
        Self {
            name: item.full_name.trim().to_string(),
            title: non_blank(item.headline),
            location: non_blank(item.location),
            profile_url: non_blank(item.profile_url),
            avatar_url: non_blank(item.profile_picture),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Classify a raw people-search body.
pub(crate) fn classify_response(body: &str) -> Result<EnrichmentOutcome, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

    if !response.success {
        return Err(LookupError::Rejected {
            provider: PROVIDER.to_string(),
            message: response.message,
        });
    }

    let data = response.data.ok_or_else(|| LookupError::InvalidResponse {
        provider: PROVIDER.to_string(),
        reason: "missing data".to_string(),
    })?;

    debug!(total = data.total, items = data.items.len(), "Directory search returned");

    let candidates = data.items.into_iter().map(CandidatePerson::from).collect();
    Ok(EnrichmentOutcome::classify(candidates))
}

/// Directory people-search client.
pub struct DirectoryClient {
    client: reqwest::Client,
    api_key: SecretString,
    host: String,
    base_url: String,
}

impl DirectoryClient {
    /// Build a client with the given request timeout.
    pub fn new(config: &DirectoryConfig, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            host: config.host.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search-people", self.base_url)
    }
}

#[async_trait]
impl EnrichmentLookup for DirectoryClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn lookup(&self, organization_key: &str) -> Result<EnrichmentOutcome, LookupError> {
        let resp = self
            .client
            .get(self.search_url())
            .query(&[("keywords", organization_key), ("start", "0")])
            .header("x-rapidapi-key", self.api_key.expose_secret())
            .header("x-rapidapi-host", &self.host)
            .send()
            .await
            .map_err(|e| LookupError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| LookupError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(LookupError::Status {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        classify_response(&body)
    }
}
