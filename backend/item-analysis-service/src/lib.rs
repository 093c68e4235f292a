//! Item Analysis Service - photo-to-metadata appraisal for household items
//!
//! This service provides:
//! - Gemini vision analysis of an uploaded photo into a typed item record
//! - Bounded retry of transient provider failures, fail-fast on permanent ones
//! - Schema validation of the provider reply and form <-> record mapping
//! - Optional Exa market-price enrichment that never fails the primary result

pub mod config;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod services;
pub mod store;

pub use config::{Config, CredentialSource, EnvCredentials, ProviderCredentials, StaticCredentials};
pub use models::{AnalysisOptions, AnalysisRequest, ItemAnalysis, ItemForm, ItemRecord};
pub use providers::{ExaSearchClient, GeminiClient, MarketSearch, VisionProvider};
pub use services::{parse_item_analysis, AnalyzerSettings, ItemAnalyzer};
pub use store::{InMemoryItemStore, ItemStore};
