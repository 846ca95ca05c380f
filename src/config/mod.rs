//! Process configuration loaded from the environment
//!
//! Read once at startup. A missing completion-service key is fatal; every
//! other setting has a default.

use crate::llm::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::parsers::ExtractionPolicy;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_STORAGE_TABLE: &str = "analyses";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    MissingVar(&'static str),

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection details for the durable result store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub url: String,
    pub key: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub upstream_timeout_secs: u64,
    pub extraction_policy: ExtractionPolicy,
    /// Durable backend; `None` selects the in-memory store
    pub storage: Option<StorageConfig>,
    pub port: u16,
    pub bind: String,
    pub public_dir: String,
    pub cors_origins: Option<Vec<String>>,
}

impl AppConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("PERPLEXITY_KEY").ok_or(ConfigError::MissingVar("PERPLEXITY_KEY"))?;

        let upstream_timeout_secs = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("UPSTREAM_TIMEOUT_SECS", &raw).and_then(|secs| {
                if secs == 0 {
                    Err(ConfigError::InvalidValue {
                        name: "UPSTREAM_TIMEOUT_SECS",
                        value: raw.clone(),
                        reason: "must be greater than zero".to_string(),
                    })
                } else {
                    Ok(secs)
                }
            })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        let extraction_policy = match get("EXTRACTION_POLICY") {
            Some(raw) => {
                ExtractionPolicy::from_name(&raw).ok_or_else(|| ConfigError::InvalidValue {
                    name: "EXTRACTION_POLICY",
                    value: raw.clone(),
                    reason: "expected 'soft' or 'hard'".to_string(),
                })?
            }
            None => ExtractionPolicy::default(),
        };

        let storage = match (get("SUPABASE_URL"), get("SUPABASE_KEY")) {
            (Some(url), Some(key)) => Some(StorageConfig {
                url,
                key,
                table: get("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_STORAGE_TABLE.to_string()),
            }),
            (Some(_), None) | (None, Some(_)) => {
                log::warn!("Only one of SUPABASE_URL/SUPABASE_KEY is set; durable storage disabled");
                None
            }
            (None, None) => None,
        };

        let port = match get("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let cors_origins = get("CORS_ORIGINS").map(|raw| {
            raw.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect::<Vec<_>>()
        });

        Ok(Self {
            api_key,
            api_url: get("PERPLEXITY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: get("PERPLEXITY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            upstream_timeout_secs,
            extraction_policy,
            storage,
            port,
            bind: get("BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            public_dir: get("PUBLIC_DIR").unwrap_or_else(|| DEFAULT_PUBLIC_DIR.to_string()),
            cors_origins,
        })
    }

    /// Defaults for everything except the key
    pub fn for_api_key(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            extraction_policy: ExtractionPolicy::default(),
            storage: None,
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            public_dir: DEFAULT_PUBLIC_DIR.to_string(),
            cors_origins: None,
        }
    }
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
