//! Health endpoints
use actix_web::{web, HttpResponse};
use error_types::classify;
use resilience::with_timeout_result;
use serde::Serialize;
use tracing::warn;

use crate::config::{Config, CredentialSource};
use crate::services::ItemAnalyzer;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub gemini_api_key: bool,
    pub exa_api_key: bool,
    /// `ok`, `unreachable`, or `skipped` when there is no key to probe with
    pub provider: &'static str,
}

/// `GET /api/health`: configuration presence plus a bounded connectivity probe
///
/// Only reads; never touches analysis state.
pub async fn health_check(
    analyzer: web::Data<ItemAnalyzer>,
    credentials: web::Data<dyn CredentialSource>,
    config: web::Data<Config>,
) -> HttpResponse {
    let credentials = credentials.load();

    let provider = match credentials.gemini_api_key() {
        None => "skipped",
        Some(key) => {
            let vision = analyzer.vision();
            match with_timeout_result(config.health_probe_timeout(), vision.probe(key)).await {
                Ok(()) => "ok",
                Err(e) => {
                    let error = classify(e);
                    warn!(
                        provider = vision.name(),
                        code = error.code(),
                        "Provider connectivity probe failed"
                    );
                    "unreachable"
                }
            }
        }
    };

    let healthy = credentials.gemini_api_key().is_some() && provider == "ok";
    let report = HealthReport {
        status: if healthy { "ok" } else { "degraded" },
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            gemini_api_key: credentials.gemini_api_key().is_some(),
            exa_api_key: credentials.exa_api_key().is_some(),
            provider,
        },
    };

    if healthy {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::ServiceUnavailable().json(report)
    }
}

/// `GET /api/health/live`
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
