//! Domain types for item appraisal

pub mod analysis;
pub mod form;
pub mod request;

pub use analysis::{
    Category, Condition, EnrichmentMetadata, EnrichmentStatus, ItemAnalysis, PriceEstimate,
    RecommendedAction,
};
pub use form::{Attachment, ItemForm, ItemRecord};
pub use request::{AnalysisOptions, AnalysisRequest, MediaType, MAX_IMAGE_BYTES};
