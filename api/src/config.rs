//! Process configuration read from the environment.

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use govdesk_engine::{AcceptancePolicy, EngineConfig};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Azure OpenAI embedding deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct AzureEmbeddingConfig {
    pub endpoint: Url,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub database_url: String,
    pub directory_base_url: Url,
    pub rasa_base_url: Url,
    /// `None` selects the built-in hashing embedder.
    pub azure_embeddings: Option<AzureEmbeddingConfig>,
    pub embedding_dimensions: usize,
    pub sweep_interval: Duration,
    pub engine: EngineConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let azure_embeddings = match get("AZURE_OPENAI_ENDPOINT") {
            Some(endpoint) => Some(AzureEmbeddingConfig {
                endpoint: parse_base_url("AZURE_OPENAI_ENDPOINT", &endpoint)?,
                api_key: get("AZURE_OPENAI_API_KEY")
                    .ok_or(ConfigError::Missing("AZURE_OPENAI_API_KEY"))?,
                api_version: get("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| "2023-05-15".to_string()),
                deployment: get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT")
                    .ok_or(ConfigError::Missing("AZURE_OPENAI_EMBEDDING_DEPLOYMENT"))?,
            }),
            None => None,
        };

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            acceptance: AcceptancePolicy {
                threshold: parsed(&get, "DECISION_ACCEPT_THRESHOLD", defaults.acceptance.threshold)?,
                fallback_threshold: parsed(
                    &get,
                    "DECISION_FALLBACK_THRESHOLD",
                    defaults.acceptance.fallback_threshold,
                )?,
                min_gap: parsed(&get, "DECISION_MIN_GAP", defaults.acceptance.min_gap)?,
                max_alternatives: defaults.acceptance.max_alternatives,
            },
            classifier_min_confidence: parsed(
                &get,
                "DECISION_CLASSIFIER_MIN_CONFIDENCE",
                defaults.classifier_min_confidence,
            )?,
            semantic_top_k: positive(&get, "DECISION_SEMANTIC_TOP_K", defaults.semantic_top_k)?,
            storage_offset_hours: parsed(
                &get,
                "DECISION_STORAGE_OFFSET_HOURS",
                defaults.storage_offset_hours,
            )?,
            timezone: parsed::<Tz>(&get, "DECISION_TIMEZONE", defaults.timezone)?,
            context_idle_ttl: Duration::from_secs(positive(
                &get,
                "CONTEXT_IDLE_TTL_SECS",
                defaults.context_idle_ttl.as_secs(),
            )?),
        };

        Ok(Self {
            port: parsed(&get, "PORT", 4100)?,
            database_url,
            directory_base_url: parse_base_url(
                "DIRECTORY_BASE_URL",
                &get("DIRECTORY_BASE_URL").unwrap_or_else(|| "http://localhost:4000".to_string()),
            )?,
            rasa_base_url: parse_base_url(
                "RASA_BASE_URL",
                &get("RASA_BASE_URL").unwrap_or_else(|| "http://localhost:5005".to_string()),
            )?,
            azure_embeddings,
            embedding_dimensions: positive(&get, "EMBEDDING_DIMENSIONS", 256)?,
            sweep_interval: Duration::from_secs(positive(&get, "CONTEXT_SWEEP_INTERVAL_SECS", 300)?),
            engine,
        })
    }
}

fn parsed<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Like [`parsed`], but zero is rejected.
fn positive<T: FromStr + Default + PartialEq>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let value = parsed(get, key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: get(key).unwrap_or_default(),
        });
    }
    Ok(value)
}

/// Parses a base URL and makes sure its path ends with `/`, so relative
/// joins append instead of replacing the last segment.
fn parse_base_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value).map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
