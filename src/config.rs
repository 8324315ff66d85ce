//! Configuration types, built from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::lookup::LookupBackend;

/// Default directory API host.
pub const DEFAULT_DIRECTORY_HOST: &str = "linkedin-api8.p.rapidapi.com";

/// Credentials and endpoint for the professional-directory provider.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub api_key: SecretString,
    /// Sent as the `x-rapidapi-host` header.
    pub host: String,
    pub base_url: String,
}

/// Where enrichment lookups go.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub directory: Option<DirectoryConfig>,
    /// Search service speaking the enrichment wire format. Takes precedence.
    pub remote_url: Option<String>,
    pub timeout: Duration,
}

impl LookupConfig {
    pub fn backend(&self) -> LookupBackend {
        if self.remote_url.is_some() {
            LookupBackend::Remote
        } else {
            LookupBackend::Directory
        }
    }
}

/// How the operator resolves multi-match disambiguations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Numbered prompt on the terminal.
    Cli,
    /// HTTP operator surface.
    Http,
}

impl std::str::FromStr for GateMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "http" => Ok(Self::Http),
            other => Err(format!("Unknown gate mode: {other}")),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub lookup: LookupConfig,
    pub gate: GateMode,
    /// Port for the operator HTTP surface.
    pub http_port: u16,
    /// Optional JSON export of the enriched contacts.
    pub output_path: Option<PathBuf>,
}

impl EnrichConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let timeout_secs: u64 = parse_or(&get, "ENRICH_HTTP_TIMEOUT_SECS", 30)?;
        let http_port: u16 = parse_or(&get, "ENRICH_HTTP_PORT", 8080)?;
        let gate: GateMode = parse_or(&get, "ENRICH_GATE", GateMode::Cli)?;

        let remote_url = get("ENRICH_LOOKUP_URL");

        let directory = match get("DIRECTORY_API_KEY") {
            Some(api_key) => {
                let host =
                    get("DIRECTORY_API_HOST").unwrap_or_else(|| DEFAULT_DIRECTORY_HOST.to_string());
                let base_url = get("DIRECTORY_BASE_URL").unwrap_or_else(|| format!("https://{host}"));
                Some(DirectoryConfig {
                    api_key: SecretString::from(api_key),
                    host,
                    base_url,
                })
            }
            None if remote_url.is_none() => {
                return Err(ConfigError::MissingEnvVar("DIRECTORY_API_KEY".to_string()));
            }
            None => None,
        };

        Ok(Self {
            lookup: LookupConfig {
                directory,
                remote_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            gate,
            http_port,
            output_path: get("ENRICH_OUTPUT").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
