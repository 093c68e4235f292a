/// End-to-end pipeline tests with fake providers
mod common;

use bytes::Bytes;
use common::{valid_reply, FakeSearch, ScriptedVision, SearchBehavior};
use error_types::ErrorKind;
use item_analysis_service::models::{
    AnalysisOptions, AnalysisRequest, Category, Condition, EnrichmentStatus, RecommendedAction,
};
use item_analysis_service::{parse_item_analysis, AnalyzerSettings, ItemAnalyzer, ProviderCredentials};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn jpeg(len: usize) -> AnalysisRequest {
    AnalysisRequest::new(Bytes::from(vec![0xAB; len]), "image/jpeg", AnalysisOptions::default())
}

fn enriched_jpeg() -> AnalysisRequest {
    AnalysisRequest::new(
        Bytes::from_static(b"\xff\xd8\xff\xe0"),
        "image/jpeg",
        AnalysisOptions {
            enable_enrichment: true,
            ..Default::default()
        },
    )
}

fn both_keys() -> ProviderCredentials {
    ProviderCredentials::new(Some("gemini-key"), Some("exa-key"))
}

fn analyzer(vision: Arc<ScriptedVision>) -> ItemAnalyzer {
    ItemAnalyzer::new(vision, AnalyzerSettings::default())
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_then_success() {
    let vision = Arc::new(ScriptedVision::new(vec![
        Err("429 Too Many Requests: rate limit exceeded".to_string()),
        Ok(valid_reply()),
    ]));
    let start = Instant::now();

    let analysis = analyzer(vision.clone())
        .analyze(&jpeg(1024), &both_keys())
        .await
        .unwrap();

    assert_eq!(analysis.category(), Category::Kitchenware);
    assert_eq!(vision.calls(), 2);
    assert_eq!(start.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_api_key_fails_once_without_waiting() {
    let vision = Arc::new(ScriptedVision::failing("invalid api key"));
    let start = Instant::now();

    let err = analyzer(vision.clone())
        .analyze(&jpeg(1024), &both_keys())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
    assert_eq!(vision.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_exhaust_budget() {
    let vision = Arc::new(ScriptedVision::failing(
        "network error: provider responded with 503 Service Unavailable",
    ));
    let start = Instant::now();

    let err = analyzer(vision.clone())
        .analyze(&jpeg(1024), &both_keys())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.http_status(), 503);
    assert_eq!(vision.calls(), 3);
    // 250ms + 500ms, no wait after the last attempt
    assert_eq!(start.elapsed(), Duration::from_millis(750));
}

#[tokio::test]
async fn test_malformed_reply_is_parse_error() {
    let vision = Arc::new(ScriptedVision::replying("{not json"));

    let err = analyzer(vision.clone())
        .analyze(&jpeg(1024), &both_keys())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.http_status(), 422);
    assert_eq!(vision.calls(), 1);
}

#[tokio::test]
async fn test_inverted_price_reply_is_parse_error() {
    let mut reply: serde_json::Value = serde_json::from_str(&valid_reply()).unwrap();
    reply["thriftPrice"] = serde_json::json!({ "low": 900, "high": 100 });
    let vision = Arc::new(ScriptedVision::replying(reply.to_string()));

    let err = analyzer(vision)
        .analyze(&jpeg(1024), &both_keys())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.violations()[0].field, "thrift_price.high");
}

#[tokio::test]
async fn test_oversize_upload_never_reaches_provider() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));

    let err = analyzer(vision.clone())
        .analyze(&jpeg(11 * 1024 * 1024), &both_keys())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.http_status(), 400);
    assert_eq!(vision.calls(), 0);
}

#[tokio::test]
async fn test_missing_credential_never_reaches_provider() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));

    let err = analyzer(vision.clone())
        .analyze(&jpeg(1024), &ProviderCredentials::new(None, Some("exa-key")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(vision.calls(), 0);
}

#[tokio::test]
async fn test_enrichment_success_is_attached() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let search = Arc::new(FakeSearch::new(SearchBehavior::Listings(4)));

    let analysis = analyzer(vision)
        .with_market_search(search.clone())
        .analyze(&enriched_jpeg(), &both_keys())
        .await
        .unwrap();

    let enrichment = analysis.enrichment().unwrap();
    assert_eq!(enrichment.status, EnrichmentStatus::Success);
    assert_eq!(enrichment.result_count, 4);
    assert_eq!(search.calls(), 1);
}

#[tokio::test]
async fn test_enrichment_failure_degrades_silently() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let search = Arc::new(FakeSearch::new(SearchBehavior::Fail("market search responded with 500")));

    let analysis = analyzer(vision)
        .with_market_search(search.clone())
        .analyze(&enriched_jpeg(), &both_keys())
        .await
        .unwrap();

    assert!(analysis.enrichment().is_none());
    assert_eq!(search.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_enrichment_timeout_degrades_silently() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let search = Arc::new(FakeSearch::new(SearchBehavior::Hang));
    let start = Instant::now();

    let analysis = analyzer(vision)
        .with_market_search(search)
        .analyze(&enriched_jpeg(), &both_keys())
        .await
        .unwrap();

    assert!(analysis.enrichment().is_none());
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test]
async fn test_enrichment_not_requested_is_not_called() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let search = Arc::new(FakeSearch::new(SearchBehavior::Listings(1)));

    let analysis = analyzer(vision)
        .with_market_search(search.clone())
        .analyze(&jpeg(1024), &both_keys())
        .await
        .unwrap();

    assert!(analysis.enrichment().is_none());
    assert_eq!(search.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_surfaces_as_network_error() {
    let vision =
        Arc::new(ScriptedVision::replying(valid_reply()).with_delay(Duration::from_secs(30)));

    let err = analyzer(vision.clone())
        .analyze_with_deadline(&jpeg(1024), &both_keys(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.http_status(), 503);
    assert!(err.message().contains("タイムアウト"));
    assert_eq!(err.detail(), Some("analysis deadline of 5s exceeded"));
    assert_eq!(vision.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_analyses_are_independent() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let shared = Arc::new(analyzer(vision.clone()));
    let credentials = both_keys();

    let ok_request = jpeg(2048);
    let bad_request = AnalysisRequest::new(
        Bytes::from_static(b"GIF89a"),
        "image/gif",
        AnalysisOptions::default(),
    );

    let (ok, bad) = tokio::join!(
        shared.analyze(&ok_request, &credentials),
        shared.analyze(&bad_request, &credentials)
    );

    assert!(ok.is_ok());
    assert_eq!(bad.unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(vision.calls(), 1);
}

#[test]
fn test_parsed_record_is_read_through_accessors() {
    let analysis = parse_item_analysis(&valid_reply()).unwrap();

    assert_eq!(analysis.name_en_generic(), "Electric kettle");
    assert_eq!(analysis.condition(), Condition::Good);
    assert_eq!(analysis.quantity(), 1);
    assert_eq!(analysis.online_price().high, 2800.0);
    assert_eq!(analysis.recommended_action(), RecommendedAction::OnlineSale);
    assert_eq!(analysis.marketplaces(), ["メルカリ", "ラクマ"]);
    assert_eq!(analysis.search_queries(), ["象印 CK-DA10"]);
    assert_eq!(analysis.special_notes(), None);
    assert_eq!(analysis.disposal_cost(), None);
    assert!(analysis.enrichment().is_none());
}
