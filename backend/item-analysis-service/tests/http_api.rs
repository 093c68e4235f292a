/// HTTP surface tests: multipart upload in, JSON envelope out
mod common;

use actix_web::{http::StatusCode, test, web, App};
use common::{valid_reply, FakeSearch, ScriptedVision, SearchBehavior};
use item_analysis_service::{
    handlers, AnalyzerSettings, Config, CredentialSource, ItemAnalyzer, StaticCredentials,
};
use resilience::RetryConfig;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const BOUNDARY: &str = "----item-analysis-test-boundary";

enum Part<'a> {
    File {
        name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"item.bin\"\r\nContent-Type: {}\r\n\r\n",
                        name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/analyze")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

fn fast_settings() -> AnalyzerSettings {
    AnalyzerSettings {
        retry: RetryConfig {
            base_delay: Duration::from_millis(1),
            ..RetryConfig::default()
        },
        ..AnalyzerSettings::default()
    }
}

fn keys(gemini: Option<&str>, exa: Option<&str>) -> web::Data<dyn CredentialSource> {
    let source: Arc<dyn CredentialSource> = Arc::new(StaticCredentials {
        gemini_api_key: gemini.map(str::to_string),
        exa_api_key: exa.map(str::to_string),
    });
    web::Data::from(source)
}

macro_rules! service {
    ($analyzer:expr, $credentials:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($analyzer))
                .app_data($credentials)
                .app_data(web::Data::new(Config::default()))
                .configure(handlers::configure),
        )
        .await
    };
}

const JPEG: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF";

#[actix_web::test]
async fn test_successful_analysis_returns_envelope() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(
        ItemAnalyzer::new(vision.clone(), fast_settings()),
        keys(Some("gemini-key"), None)
    );

    let req = upload_request(&[
        Part::File {
            name: "image",
            content_type: "image/jpeg",
            data: JPEG,
        },
        Part::Text {
            name: "precisionMode",
            value: "true",
        },
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["category"], "kitchenware");
    assert_eq!(body["data"]["nameEnGeneric"], "Electric kettle");
    assert!(body.get("enrichmentStatus").is_none());
    assert_eq!(vision.calls(), 1);
}

#[actix_web::test]
async fn test_enrichment_fields_are_flattened() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let search = Arc::new(FakeSearch::new(SearchBehavior::Listings(2)));
    let app = service!(
        ItemAnalyzer::new(vision, fast_settings()).with_market_search(search),
        keys(Some("gemini-key"), Some("exa-key"))
    );

    let req = upload_request(&[
        Part::File {
            name: "image",
            content_type: "image/png",
            data: b"\x89PNG\r\n\x1a\n",
        },
        Part::Text {
            name: "exaSearch",
            value: "true",
        },
        Part::Text {
            name: "municipalityCode",
            value: " 131016 ",
        },
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["enrichmentStatus"], "success");
    assert_eq!(body["enrichmentResultCount"], 2);
    assert_eq!(body["enrichmentEstimatedCost"], 0.005);
}

#[actix_web::test]
async fn test_malformed_reply_is_422() {
    let vision = Arc::new(ScriptedVision::replying("{not json"));
    let app = service!(
        ItemAnalyzer::new(vision, fast_settings()),
        keys(Some("gemini-key"), None)
    );

    let req = upload_request(&[Part::File {
        name: "image",
        content_type: "image/jpeg",
        data: JPEG,
    }])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "PARSE_ERROR");
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
}

#[actix_web::test]
async fn test_oversize_upload_is_400_without_provider_call() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(
        ItemAnalyzer::new(vision.clone(), fast_settings()),
        keys(Some("gemini-key"), None)
    );

    let big = vec![0u8; 11 * 1024 * 1024];
    let req = upload_request(&[Part::File {
        name: "image",
        content_type: "image/jpeg",
        data: &big,
    }])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(vision.calls(), 0);
}

#[actix_web::test]
async fn test_missing_image_is_400() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(
        ItemAnalyzer::new(vision.clone(), fast_settings()),
        keys(Some("gemini-key"), None)
    );

    let req = upload_request(&[Part::Text {
        name: "precisionMode",
        value: "false",
    }])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(vision.calls(), 0);
}

#[actix_web::test]
async fn test_unsupported_media_type_is_400() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(
        ItemAnalyzer::new(vision, fast_settings()),
        keys(Some("gemini-key"), None)
    );

    let req = upload_request(&[Part::File {
        name: "image",
        content_type: "image/gif",
        data: b"GIF89a",
    }])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_missing_key_is_500_configuration() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(
        ItemAnalyzer::new(vision.clone(), fast_settings()),
        keys(None, None)
    );

    let req = upload_request(&[Part::File {
        name: "image",
        content_type: "image/jpeg",
        data: JPEG,
    }])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "CONFIGURATION_ERROR");
    assert_eq!(vision.calls(), 0);
}

#[actix_web::test]
async fn test_exhausted_rate_limit_is_429() {
    let vision = Arc::new(ScriptedVision::failing("quota exceeded"));
    let app = service!(
        ItemAnalyzer::new(vision.clone(), fast_settings()),
        keys(Some("gemini-key"), None)
    );

    let req = upload_request(&[Part::File {
        name: "image",
        content_type: "image/jpeg",
        data: JPEG,
    }])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "RATE_LIMIT_ERROR");
    assert_eq!(vision.calls(), 3);
}

#[actix_web::test]
async fn test_health_reports_configuration() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(
        ItemAnalyzer::new(vision, fast_settings()),
        keys(Some("gemini-key"), None)
    );

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["geminiApiKey"], true);
    assert_eq!(body["checks"]["exaApiKey"], false);
    assert_eq!(body["checks"]["provider"], "ok");
}

#[actix_web::test]
async fn test_health_degraded_without_key() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(ItemAnalyzer::new(vision, fast_settings()), keys(None, None));

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["provider"], "skipped");
}

#[actix_web::test]
async fn test_liveness() {
    let vision = Arc::new(ScriptedVision::replying(valid_reply()));
    let app = service!(ItemAnalyzer::new(vision, fast_settings()), keys(None, None));

    let req = test::TestRequest::get().uri("/api/health/live").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}
