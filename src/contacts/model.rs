//! Contact data model: seeds, line errors, and enrichment results.

use serde::{Deserialize, Serialize};

/// A validated name/email pair extracted from one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSeed {
    /// Trimmed, non-empty display name.
    pub name: String,
    /// Email address as it appeared in the input.
    pub email: String,
}

impl ContactSeed {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Why a line could not become a contact seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineErrorReason {
    NoEmail,
    NoName,
}

impl std::fmt::Display for LineErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEmail => write!(f, "No valid email found"),
            Self::NoName => write!(f, "No name found"),
        }
    }
}

/// A rejected input line. Informational only, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineError {
    /// 1-based position among the non-blank input lines.
    pub line_number: usize,
    pub raw_line: String,
    pub reason: LineErrorReason,
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Line {}: {} - \"{}\"",
            self.line_number, self.reason, self.raw_line
        )
    }
}

/// The finalized enrichment attached to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

/// A provisional match awaiting human confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePerson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<CandidatePerson> for PersonSummary {
    fn from(candidate: CandidatePerson) -> Self {
        Self {
            name: candidate.name,
            title: candidate.title,
            location: candidate.location,
            profile_url: candidate.profile_url,
        }
    }
}

/// How a contact's enrichment ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContactStatus {
    /// Not yet processed.
    Pending,
    /// The lookup returned exactly one person.
    Matched,
    /// The operator picked one of several candidates.
    Selected,
    /// The lookup confirmed there is nobody to attach.
    NotFound,
    /// The lookup could not determine an answer.
    Failed { detail: String },
}

impl ContactStatus {
    /// Whether the orchestrator has finished with this contact.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A contact seed plus whatever enrichment it has received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedContact {
    #[serde(flatten)]
    pub seed: ContactSeed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<PersonSummary>,
    #[serde(flatten)]
    pub status: ContactStatus,
}

impl From<ContactSeed> for EnrichedContact {
    fn from(seed: ContactSeed) -> Self {
        Self {
            seed,
            summary: None,
            status: ContactStatus::Pending,
        }
    }
}
