//! Optional market-price lookup
//!
//! The lookup runs as its own task and is joined with a timeout. Whatever happens
//! to it, the primary analysis is returned: failures are logged and the enrichment
//! fields stay empty.
use error_types::classify;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{EnrichmentMetadata, EnrichmentStatus, ItemAnalysis};
use crate::providers::MarketSearch;

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    /// Upper bound on the whole lookup
    pub timeout: Duration,
    pub num_results: u32,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            num_results: 10,
        }
    }
}

pub struct Enricher {
    search: Arc<dyn MarketSearch>,
    settings: EnrichmentSettings,
}

impl Enricher {
    pub fn new(search: Arc<dyn MarketSearch>, settings: EnrichmentSettings) -> Self {
        Self { search, settings }
    }

    /// Look up market listings for `analysis`; `None` on any failure
    pub async fn enrich(
        &self,
        api_key: &SecretString,
        analysis: &ItemAnalysis,
    ) -> Option<EnrichmentMetadata> {
        let Some(query) = analysis.market_query() else {
            debug!("No usable search text, skipping enrichment");
            return None;
        };

        let search = Arc::clone(&self.search);
        let api_key = SecretString::from(api_key.expose_secret().to_owned());
        let num_results = self.settings.num_results;

        let mut handle =
            tokio::spawn(async move { search.search(&api_key, &query, num_results).await });

        match tokio::time::timeout(self.settings.timeout, &mut handle).await {
            Ok(Ok(Ok(result))) => {
                let result_count = result.result_count();
                let status = if result_count > 0 {
                    EnrichmentStatus::Success
                } else {
                    EnrichmentStatus::NoResults
                };
                info!(result_count, cost = ?result.estimated_cost, "Enrichment completed");

                Some(EnrichmentMetadata {
                    status,
                    result_count,
                    estimated_cost: result.estimated_cost,
                })
            }
            Ok(Ok(Err(e))) => {
                let error = classify(e);
                warn!(
                    code = error.code(),
                    detail = error.detail().unwrap_or(""),
                    "Enrichment failed, continuing without it"
                );
                None
            }
            Ok(Err(join_error)) => {
                warn!(error = %join_error, "Enrichment task aborted, continuing without it");
                None
            }
            Err(_) => {
                handle.abort();
                warn!(
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    "Enrichment timed out, continuing without it"
                );
                None
            }
        }
    }
}
