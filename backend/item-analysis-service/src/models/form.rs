//! Editable form shape and the mapping to and from stored records
use bytes::Bytes;
use chrono::{DateTime, Utc};
use error_types::validation::summarize;
use error_types::{AppError, AppResult, FieldViolation};
use serde::{Deserialize, Serialize};

use super::analysis::{
    Category, Condition, EnrichmentMetadata, ItemAnalysis, PriceEstimate, RecommendedAction,
};

/// Binary payload attached to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub media_type: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

/// What the item store persists
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub analysis: ItemAnalysis,
    pub image: Attachment,
    pub thumbnail: Attachment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Form-shaped copy of an [`ItemAnalysis`]
///
/// Every field has a defined value: missing text is `""`, missing lists are `[]`, and the
/// optional number is kept as text so an empty input box stays empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    pub name_ja_specific: String,
    pub name_en_specific: String,
    pub name_ja_generic: String,
    pub name_en_generic: String,
    pub description: String,
    pub category: Category,
    pub condition: Condition,
    pub quantity: u32,
    pub online_price: PriceEstimate,
    pub thrift_price: PriceEstimate,
    pub recommended_action: RecommendedAction,
    pub action_rationale: String,
    pub marketplaces: Vec<String>,
    pub search_queries: Vec<String>,
    pub keywords: Vec<String>,
    pub special_notes: String,
    pub disposal_cost: String,
    pub enrichment: Option<EnrichmentMetadata>,

    #[serde(skip)]
    pub image: Option<Attachment>,
    #[serde(skip)]
    pub thumbnail: Option<Attachment>,
}

impl ItemForm {
    /// Initial form values for a fresh analysis
    pub fn from_analysis(analysis: &ItemAnalysis) -> Self {
        Self {
            name_ja_specific: analysis.name_ja_specific.clone(),
            name_en_specific: analysis.name_en_specific.clone(),
            name_ja_generic: analysis.name_ja_generic.clone(),
            name_en_generic: analysis.name_en_generic.clone(),
            description: analysis.description.clone(),
            category: analysis.category,
            condition: analysis.condition,
            quantity: analysis.quantity,
            online_price: analysis.online_price.clone(),
            thrift_price: analysis.thrift_price.clone(),
            recommended_action: analysis.recommended_action,
            action_rationale: analysis.action_rationale.clone(),
            marketplaces: analysis.marketplaces.clone(),
            search_queries: analysis.search_queries.clone(),
            keywords: analysis.keywords.clone(),
            special_notes: analysis.special_notes.clone().unwrap_or_default(),
            disposal_cost: analysis
                .disposal_cost
                .map(|cost| cost.to_string())
                .unwrap_or_default(),
            enrichment: analysis.enrichment.clone(),
            image: None,
            thumbnail: None,
        }
    }

    /// Form for editing an existing record, attachments included
    pub fn from_record(record: &ItemRecord) -> Self {
        Self::from_analysis(&record.analysis)
            .with_attachments(record.image.clone(), record.thumbnail.clone())
    }

    pub fn with_attachments(mut self, image: Attachment, thumbnail: Attachment) -> Self {
        self.image = Some(image);
        self.thumbnail = Some(thumbnail);
        self
    }

    /// Validate user edits and build the record to persist
    ///
    /// `created_at` is kept for existing records; new ones are stamped with `now`.
    pub fn into_record(
        self,
        now: DateTime<Utc>,
        created_at: Option<DateTime<Utc>>,
    ) -> AppResult<ItemRecord> {
        let (image, thumbnail) = match (self.image, self.thumbnail) {
            (Some(image), Some(thumbnail)) => (image, thumbnail),
            (image, _) => {
                let missing = if image.is_none() { "image" } else { "thumbnail" };
                return Err(AppError::validation()
                    .with_message("画像ファイルが必要です。写真を撮影するか選択してください。")
                    .with_detail(format!("missing {} attachment", missing))
                    .with_violations(vec![FieldViolation::new(
                        missing,
                        "required",
                        "必須項目です",
                    )]));
            }
        };

        let disposal_cost = parse_optional_number("disposal_cost", &self.disposal_cost)?;
        let special_notes = Some(self.special_notes).filter(|s| !s.trim().is_empty());

        let analysis = ItemAnalysis {
            name_ja_specific: self.name_ja_specific,
            name_en_specific: self.name_en_specific,
            name_ja_generic: self.name_ja_generic,
            name_en_generic: self.name_en_generic,
            description: self.description,
            category: self.category,
            condition: self.condition,
            quantity: self.quantity,
            online_price: self.online_price,
            thrift_price: self.thrift_price,
            recommended_action: self.recommended_action,
            action_rationale: self.action_rationale,
            marketplaces: self.marketplaces,
            search_queries: self.search_queries,
            keywords: self.keywords,
            special_notes,
            disposal_cost,
            enrichment: self.enrichment,
        };

        let violations = analysis.contract_violations();
        if !violations.is_empty() {
            return Err(AppError::validation()
                .with_detail(summarize(&violations))
                .with_violations(violations));
        }

        Ok(ItemRecord {
            analysis,
            image,
            thumbnail,
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        })
    }
}

/// Empty input means "no value", never NaN
fn parse_optional_number(field: &str, raw: &str) -> AppResult<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(AppError::validation()
            .with_detail(format!("{} is not a number: {:?}", field, raw))
            .with_violations(vec![FieldViolation::new(
                field,
                "number",
                "数値を入力してください",
            )])),
    }
}
