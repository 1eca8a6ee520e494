//! Process configuration, read once from the environment at startup.
//!
//! `.env` loading happens in `main` before [`Config::from_env`] runs, so
//! everything here only sees plain key/value lookups.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

pub const DEFAULT_PINECONE_INDEX: &str = "marriott-concierge";
pub const DEFAULT_PINECONE_NAMESPACE: &str = "hotel-knowledge";

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "anthropic/claude-3-opus-20240229";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an AI concierge for Marriott hotels, providing personalized assistance to guests.";
pub const DEFAULT_APP_REFERER: &str = "http://localhost:3000";
pub const DEFAULT_APP_TITLE: &str = "Marriott Concierge";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// API credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingsConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: ApiKey,
    /// Base URL of the index data plane, e.g. `https://idx-abc123.svc.us-east1-gcp.pinecone.io`.
    pub index_host: String,
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    /// Sent as `HTTP-Referer`; OpenRouter uses it for app attribution.
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub log_level: String,
    pub cors_allowed_origins: Vec<String>,
    /// `None` keeps reqwest's default (no overall timeout).
    pub upstream_timeout: Option<Duration>,
    pub embeddings: EmbeddingsConfig,
    pub pinecone: PineconeConfig,
    pub openrouter: OpenRouterConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let embeddings = EmbeddingsConfig {
            api_key: ApiKey::new(env.required("OPENAI_API_KEY")?),
            base_url: trim_url(env.or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)),
            model: env.or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
        };

        let pinecone = PineconeConfig {
            api_key: ApiKey::new(env.required("PINECONE_API_KEY")?),
            index_host: pinecone_host(&env)?,
            namespace: env.or("PINECONE_NAMESPACE", DEFAULT_PINECONE_NAMESPACE),
        };

        let openrouter = OpenRouterConfig {
            api_key: ApiKey::new(env.required("OPENROUTER_API_KEY")?),
            base_url: trim_url(env.or("OPENROUTER_BASE_URL", DEFAULT_OPENROUTER_BASE_URL)),
            model: env.or("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            system_prompt: env.or("CONCIERGE_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            referer: env.or("APP_REFERER", DEFAULT_APP_REFERER),
            title: env.or("APP_TITLE", DEFAULT_APP_TITLE),
        };

        let upstream_timeout = match env.get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: "UPSTREAM_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            bind_address: env.or("BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            log_level: env.or("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            cors_allowed_origins: parse_origins(&env.or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGIN)),
            upstream_timeout,
            embeddings,
            pinecone,
            openrouter,
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }
}

// An explicit host wins. Otherwise fall back to the legacy
// `{index}-{project}.svc.{environment}` form.
fn pinecone_host<F>(env: &Env<F>) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = env.get("PINECONE_INDEX_HOST") {
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        return Ok(trim_url(host));
    }

    let environment = env.required("PINECONE_ENVIRONMENT")?;
    let project = env.required("PINECONE_PROJECT_ID")?;
    let index = env.or("PINECONE_INDEX_NAME", DEFAULT_PINECONE_INDEX);
    Ok(format!("https://{index}-{project}.svc.{environment}.pinecone.io"))
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
