//! Item analysis business logic

pub mod analyzer;
pub mod enrichment;
pub mod transformer;

pub use analyzer::{AnalyzerSettings, ItemAnalyzer};
pub use enrichment::{Enricher, EnrichmentSettings};
pub use transformer::parse_item_analysis;
