//! HTTP surface
//!
//! The only layer that knows about status codes; everything below works in
//! `AppError` and `ItemAnalysis`.

pub mod analyze;
pub mod health;
pub mod response;

pub use analyze::analyze_item;
pub use health::{health_check, liveness};
pub use response::{AnalysisEnvelope, ApiError, ErrorEnvelope};

use actix_web::web;

/// Register all routes under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/analyze", web::post().to(analyze_item))
            .route("/health", web::get().to(health_check))
            .route("/health/live", web::get().to(liveness)),
    );
}
