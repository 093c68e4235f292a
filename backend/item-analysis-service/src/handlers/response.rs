//! JSON envelopes and the error -> HTTP response mapping
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::AppError;
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

use crate::models::{EnrichmentStatus, ItemAnalysis};

/// Failure body: `{ "success": false, "error": <message>, "code": <machine code> }`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub success: bool,
    pub error: &'a str,
    pub code: &'a str,
}

/// Success body; enrichment outcome is repeated at the top level when present
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEnvelope {
    pub success: bool,
    pub data: ItemAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_status: Option<EnrichmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_result_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment_estimated_cost: Option<f64>,
}

impl AnalysisEnvelope {
    pub fn new(data: ItemAnalysis) -> Self {
        let enrichment = data.enrichment.clone();
        Self {
            success: true,
            enrichment_status: enrichment.as_ref().map(|e| e.status),
            enrichment_result_count: enrichment.as_ref().map(|e| e.result_count),
            enrichment_estimated_cost: enrichment.and_then(|e| e.estimated_cost),
            data,
        }
    }
}

/// Transport wrapper so handlers can `?` an [`AppError`]
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        ApiError(error)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if self.0.is_operational() {
            warn!(status = status.as_u16(), code = self.0.code(), "Request failed");
        } else {
            error!(
                status = status.as_u16(),
                code = self.0.code(),
                detail = self.0.detail().unwrap_or(""),
                "Request failed with unexpected error"
            );
        }

        HttpResponse::build(status).json(ErrorEnvelope {
            success: false,
            error: self.0.message(),
            code: self.0.code(),
        })
    }
}
