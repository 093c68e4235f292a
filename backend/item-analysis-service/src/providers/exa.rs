//! Exa search integration for marketplace listings
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{MarketListing, MarketSearch, MarketSearchResult};

/// Exa REST client
pub struct ExaSearchClient {
    client: Client,
    api_base: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    num_results: u32,
    #[serde(rename = "type")]
    search_type: &'static str,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SearchResponse {
    results: Vec<SearchHit>,
    cost_dollars: Option<CostDollars>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct SearchHit {
    title: Option<String>,
    url: String,
    published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CostDollars {
    total: f64,
}

impl ExaSearchClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            Client::new()
        });

        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MarketSearch for ExaSearchClient {
    async fn search(
        &self,
        api_key: &SecretString,
        query: &str,
        num_results: u32,
    ) -> Result<MarketSearchResult> {
        let request = SearchRequest {
            query,
            num_results,
            search_type: "auto",
        };

        let response = self
            .client
            .post(format!("{}/search", self.api_base))
            .header("x-api-key", api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("network error: {}", e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body_len = body.len(), "Exa search failed");
            bail!("market search responded with {}", status);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("malformed search envelope: {}", e.without_url()))?;

        debug!(results = parsed.results.len(), "Exa search completed");
        Ok(into_result(parsed))
    }
}

fn into_result(response: SearchResponse) -> MarketSearchResult {
    MarketSearchResult {
        listings: response
            .results
            .into_iter()
            .map(|hit| MarketListing {
                title: hit.title.unwrap_or_default(),
                url: hit.url,
                published_date: hit.published_date,
            })
            .collect(),
        estimated_cost: response.cost_dollars.map(|c| c.total),
    }
}
