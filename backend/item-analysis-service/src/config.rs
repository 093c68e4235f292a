//! Configuration for the item analysis service
use resilience::RetryConfig;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use crate::providers::ModelSelection;
use crate::services::{AnalyzerSettings, EnrichmentSettings};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Main configuration struct, loaded from environment variables
///
/// Provider credentials are not part of it; handlers read them per request through a
/// [`CredentialSource`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP bind host
    #[serde(default = "default_server_host")]
    pub server_host: String,

    /// HTTP bind port
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Gemini model used for standard analysis
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Gemini model used when precision mode is requested
    #[serde(default = "default_gemini_precision_model")]
    pub gemini_precision_model: String,

    /// Gemini REST base URL
    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,

    /// Exa REST base URL
    #[serde(default = "default_exa_api_base")]
    pub exa_api_base: String,

    /// Per-request HTTP timeout for provider calls
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Total attempts for a provider call, including the first
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Delay before the first retry
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound for a single backoff
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,

    /// How long the enrichment lookup may take before it is dropped
    #[serde(default = "default_enrichment_timeout_secs")]
    pub enrichment_timeout_secs: u64,

    /// Number of marketplace results requested from the search provider
    #[serde(default = "default_enrichment_num_results")]
    pub enrichment_num_results: u32,

    /// Deadline for one end-to-end analysis
    #[serde(default = "default_analysis_deadline_secs")]
    pub analysis_deadline_secs: u64,

    /// Timeout for the health-check connectivity probe
    #[serde(default = "default_health_probe_timeout_secs")]
    pub health_probe_timeout_secs: u64,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_precision_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_exa_api_base() -> String {
    "https://api.exa.ai".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    60
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

fn default_retry_max_backoff_ms() -> u64 {
    8_000
}

fn default_enrichment_timeout_secs() -> u64 {
    10
}

fn default_enrichment_num_results() -> u32 {
    10
}

fn default_analysis_deadline_secs() -> u64 {
    120
}

fn default_health_probe_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_server_host(),
            server_port: default_server_port(),
            gemini_model: default_gemini_model(),
            gemini_precision_model: default_gemini_precision_model(),
            gemini_api_base: default_gemini_api_base(),
            exa_api_base: default_exa_api_base(),
            provider_timeout_secs: default_provider_timeout_secs(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
            enrichment_timeout_secs: default_enrichment_timeout_secs(),
            enrichment_num_results: default_enrichment_num_results(),
            analysis_deadline_secs: default_analysis_deadline_secs(),
            health_probe_timeout_secs: default_health_probe_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("RETRY_MAX_ATTEMPTS", u64::from(self.retry_max_attempts)),
            ("PROVIDER_TIMEOUT_SECS", self.provider_timeout_secs),
            ("ENRICHMENT_TIMEOUT_SECS", self.enrichment_timeout_secs),
            ("ANALYSIS_DEADLINE_SECS", self.analysis_deadline_secs),
            ("HEALTH_PROBE_TIMEOUT_SECS", self.health_probe_timeout_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    name,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        for (name, value) in [
            ("GEMINI_API_BASE", &self.gemini_api_base),
            ("EXA_API_BASE", &self.exa_api_base),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    name,
                    reason: format!("not an http(s) URL: {}", value),
                });
            }
        }

        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_backoff: Duration::from_millis(self.retry_max_backoff_ms),
            ..RetryConfig::default()
        }
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            retry: self.retry_config(),
            models: ModelSelection {
                standard: self.gemini_model.clone(),
                precision: self.gemini_precision_model.clone(),
            },
            enrichment: EnrichmentSettings {
                timeout: Duration::from_secs(self.enrichment_timeout_secs),
                num_results: self.enrichment_num_results,
            },
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn analysis_deadline(&self) -> Duration {
        Duration::from_secs(self.analysis_deadline_secs)
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.health_probe_timeout_secs)
    }
}

// ============================================
// Credentials
// ============================================

/// Environment variable holding the vision provider key
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable holding the market search key
pub const EXA_API_KEY_VAR: &str = "EXA_API_KEY";

/// Provider credentials for one request
#[derive(Debug, Default)]
pub struct ProviderCredentials {
    gemini_api_key: Option<SecretString>,
    exa_api_key: Option<SecretString>,
}

impl ProviderCredentials {
    pub fn new(gemini_api_key: Option<&str>, exa_api_key: Option<&str>) -> Self {
        Self {
            gemini_api_key: gemini_api_key.and_then(non_blank_secret),
            exa_api_key: exa_api_key.and_then(non_blank_secret),
        }
    }

    /// Read both keys from the process environment
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: read_secret(GEMINI_API_KEY_VAR),
            exa_api_key: read_secret(EXA_API_KEY_VAR),
        }
    }

    pub fn gemini_api_key(&self) -> Option<&SecretString> {
        self.gemini_api_key.as_ref()
    }

    pub fn exa_api_key(&self) -> Option<&SecretString> {
        self.exa_api_key.as_ref()
    }
}

fn read_secret(name: &str) -> Option<SecretString> {
    std::env::var(name).ok().as_deref().and_then(non_blank_secret)
}

fn non_blank_secret(value: &str) -> Option<SecretString> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(SecretString::from(trimmed.to_string()))
    }
}

/// Where request handlers get credentials from
pub trait CredentialSource: Send + Sync {
    fn load(&self) -> ProviderCredentials;
}

/// Reads the environment on every call
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn load(&self) -> ProviderCredentials {
        ProviderCredentials::from_env()
    }
}

/// Fixed credentials, for tests and local tooling
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    pub gemini_api_key: Option<String>,
    pub exa_api_key: Option<String>,
}

impl CredentialSource for StaticCredentials {
    fn load(&self) -> ProviderCredentials {
        ProviderCredentials::new(self.gemini_api_key.as_deref(), self.exa_api_key.as_deref())
    }
}
