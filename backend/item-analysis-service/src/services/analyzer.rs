//! End-to-end analysis: image in, validated item record out
use error_types::{classify, AppError, AppResult};
use resilience::{with_deadline, with_retry, RetryConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::enrichment::{Enricher, EnrichmentSettings};
use super::transformer::parse_item_analysis;
use crate::config::ProviderCredentials;
use crate::models::{AnalysisRequest, ItemAnalysis};
use crate::providers::{MarketSearch, ModelSelection, PromptPayload, VisionProvider};

#[derive(Debug, Clone, Default)]
pub struct AnalyzerSettings {
    pub retry: RetryConfig,
    pub models: ModelSelection,
    pub enrichment: EnrichmentSettings,
}

/// Orchestrates one analysis per call; holds no per-request state
pub struct ItemAnalyzer {
    vision: Arc<dyn VisionProvider>,
    enricher: Option<Enricher>,
    settings: AnalyzerSettings,
}

impl ItemAnalyzer {
    pub fn new(vision: Arc<dyn VisionProvider>, settings: AnalyzerSettings) -> Self {
        Self {
            vision,
            enricher: None,
            settings,
        }
    }

    /// Enable the optional market-price lookup
    pub fn with_market_search(mut self, search: Arc<dyn MarketSearch>) -> Self {
        self.enricher = Some(Enricher::new(search, self.settings.enrichment.clone()));
        self
    }

    pub fn vision(&self) -> &Arc<dyn VisionProvider> {
        &self.vision
    }

    /// Run the pipeline: validate, check credentials, call the provider with retry,
    /// transform the reply, then optionally enrich
    #[instrument(
        skip_all,
        fields(
            file_size = request.byte_length,
            media_type = %request.media_type,
            precision_mode = request.options.precision_mode,
            enrichment = request.options.enable_enrichment,
        )
    )]
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        credentials: &ProviderCredentials,
    ) -> AppResult<ItemAnalysis> {
        let started = Instant::now();
        info!("Starting item analysis");

        let result = self.run(request, credentials).await;

        match &result {
            Ok(analysis) => info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                category = ?analysis.category,
                enriched = analysis.enrichment.is_some(),
                "Item analysis completed"
            ),
            Err(error) => error.log(),
        }

        result
    }

    /// [`Self::analyze`] bounded by a caller deadline
    ///
    /// Expiry drops the in-flight provider call or backoff timer and surfaces as a
    /// `Network` error.
    pub async fn analyze_with_deadline(
        &self,
        request: &AnalysisRequest,
        credentials: &ProviderCredentials,
        deadline: Duration,
    ) -> AppResult<ItemAnalysis> {
        with_deadline(deadline, self.analyze(request, credentials), |deadline| {
            AppError::network()
                .with_message("解析がタイムアウトしました。時間をおいて再度お試しください。")
                .with_detail(format!("analysis deadline of {:?} exceeded", deadline))
        })
        .await
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        credentials: &ProviderCredentials,
    ) -> AppResult<ItemAnalysis> {
        let media_type = request.validate()?;

        let api_key = credentials.gemini_api_key().ok_or_else(|| {
            AppError::configuration()
                .with_message("Gemini APIキーが設定されていません。管理者にお問い合わせください。")
                .with_detail("GEMINI_API_KEY is not set")
        })?;

        let payload = PromptPayload::build(
            &self.settings.models,
            &request.options,
            request.image.clone(),
            media_type,
        );
        debug!(model = %payload.model, provider = self.vision.name(), "Calling vision provider");

        let vision = &self.vision;
        let payload = &payload;
        let reply = with_retry(&self.settings.retry, move || async move {
            vision.generate(api_key, payload).await.map_err(classify)
        })
        .await
        .map_err(|e| {
            warn!(attempts = e.attempts(), code = e.error().code(), "Provider call failed");
            e.into_inner()
        })?;

        debug!(
            attempts = reply.attempts,
            waited_ms = reply.waited.as_millis() as u64,
            reply_len = reply.value.len(),
            "Provider replied"
        );

        let analysis = parse_item_analysis(&reply.value)?;

        if !request.options.enable_enrichment {
            return Ok(analysis);
        }

        match (&self.enricher, credentials.exa_api_key()) {
            (Some(enricher), Some(key)) => match enricher.enrich(key, &analysis).await {
                Some(metadata) => Ok(analysis.with_enrichment(metadata)),
                None => Ok(analysis),
            },
            (_, None) => {
                debug!("Enrichment requested but EXA_API_KEY is not set, skipping");
                Ok(analysis)
            }
            (None, Some(_)) => {
                debug!("Enrichment requested but no market search is configured, skipping");
                Ok(analysis)
            }
        }
    }
}
