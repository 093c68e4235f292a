//! External AI provider integrations

pub mod exa;
pub mod gemini;
pub mod prompt;

pub use exa::ExaSearchClient;
pub use gemini::GeminiClient;
pub use prompt::{build_prompt, ModelSelection, PromptPayload};

use async_trait::async_trait;
use secrecy::SecretString;

/// Image understanding backend
///
/// Errors are plain `anyhow` errors whose message is the only signal the classifier
/// gets, so implementations word them with the classifier's vocabulary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// One generation call; returns the raw reply text
    async fn generate(&self, api_key: &SecretString, payload: &PromptPayload) -> anyhow::Result<String>;

    /// Cheap authenticated request used by health checks
    async fn probe(&self, api_key: &SecretString) -> anyhow::Result<()>;
}

/// One marketplace listing found by the search provider
#[derive(Debug, Clone, PartialEq)]
pub struct MarketListing {
    pub title: String,
    pub url: String,
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSearchResult {
    pub listings: Vec<MarketListing>,
    /// Cost of the search in dollars, when the provider reports it
    pub estimated_cost: Option<f64>,
}

impl MarketSearchResult {
    pub fn result_count(&self) -> u32 {
        u32::try_from(self.listings.len()).unwrap_or(u32::MAX)
    }
}

/// Secondary market-price lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketSearch: Send + Sync {
    async fn search(
        &self,
        api_key: &SecretString,
        query: &str,
        num_results: u32,
    ) -> anyhow::Result<MarketSearchResult>;
}
