//! Domain record produced from a provider reply
use error_types::validation::violations_from;
use error_types::FieldViolation;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

// ============================================
// Enumerations
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Furniture,
    Appliance,
    Electronics,
    Clothing,
    Books,
    Kitchenware,
    Toys,
    Sports,
    Decor,
    Tools,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    #[default]
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendedAction {
    Keep,
    OnlineSale,
    Thrift,
    Trash,
}

// ============================================
// Price estimate
// ============================================

/// A price range with the model's confidence in it
///
/// `high >= low` is not expressible as a field rule; it is checked by
/// [`PriceEstimate::range_violation`] and reported against `high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PriceEstimate {
    #[validate(range(min = 0.0))]
    pub low: f64,

    #[validate(range(min = 0.0))]
    pub high: f64,

    #[serde(default = "default_confidence")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

impl PriceEstimate {
    pub fn new(low: f64, high: f64, confidence: f64) -> Self {
        Self {
            low,
            high,
            confidence,
        }
    }

    /// Cross-field rule: the upper bound may not be below the lower bound
    pub fn range_violation(&self, prefix: &str) -> Option<FieldViolation> {
        (self.high < self.low).then(|| {
            FieldViolation::new(
                format!("{}.high", prefix),
                "price_range",
                format!(
                    "上限価格({})は下限価格({})以上である必要があります",
                    self.high, self.low
                ),
            )
        })
    }

    fn violations(&self, prefix: &str) -> Vec<FieldViolation> {
        let mut violations = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => violations_from(prefix, &errors),
        };
        violations.extend(self.range_violation(prefix));
        violations
    }
}

// ============================================
// Enrichment metadata
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnrichmentStatus {
    /// Lookup returned at least one listing
    Success,
    /// Lookup completed but found nothing
    NoResults,
}

/// Outcome of the optional market-price lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentMetadata {
    pub status: EnrichmentStatus,
    pub result_count: u32,
    /// Cost reported by the search provider, in dollars
    #[serde(default)]
    pub estimated_cost: Option<f64>,
}

// ============================================
// Item analysis
// ============================================

/// Structured appraisal of one photographed item
///
/// Built only by [`crate::services::parse_item_analysis`] or from a validated form, so
/// every instance that reaches a caller satisfies the field rules below. Fields are
/// read through accessors; a record is not changed after it leaves the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(max = 100))]
    pub(crate) name_ja_specific: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(max = 100))]
    pub(crate) name_en_specific: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(max = 100))]
    pub(crate) name_ja_generic: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(length(max = 100))]
    pub(crate) name_en_generic: String,

    #[validate(length(min = 1, max = 1000))]
    pub(crate) description: String,

    pub(crate) category: Category,

    #[serde(default)]
    pub(crate) condition: Condition,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 999))]
    pub(crate) quantity: u32,

    pub(crate) online_price: PriceEstimate,

    pub(crate) thrift_price: PriceEstimate,

    pub(crate) recommended_action: RecommendedAction,

    #[validate(length(min = 1, max = 500))]
    pub(crate) action_rationale: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) marketplaces: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) search_queries: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) keywords: Vec<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 500))]
    pub(crate) special_notes: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub(crate) disposal_cost: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) enrichment: Option<EnrichmentMetadata>,
}

fn default_quantity() -> u32 {
    1
}

/// `null` is treated like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whitespace-only notes carry no information
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl ItemAnalysis {

    pub fn name_ja_specific(&self) -> &str {
        &self.name_ja_specific
    }

    pub fn name_en_specific(&self) -> &str {
        &self.name_en_specific
    }

    pub fn name_ja_generic(&self) -> &str {
        &self.name_ja_generic
    }

    pub fn name_en_generic(&self) -> &str {
        &self.name_en_generic
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn online_price(&self) -> &PriceEstimate {
        &self.online_price
    }

    pub fn thrift_price(&self) -> &PriceEstimate {
        &self.thrift_price
    }

    pub fn recommended_action(&self) -> RecommendedAction {
        self.recommended_action
    }

    pub fn action_rationale(&self) -> &str {
        &self.action_rationale
    }

    pub fn marketplaces(&self) -> &[String] {
        &self.marketplaces
    }

    pub fn search_queries(&self) -> &[String] {
        &self.search_queries
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn special_notes(&self) -> Option<&str> {
        self.special_notes.as_deref()
    }

    pub fn disposal_cost(&self) -> Option<f64> {
        self.disposal_cost
    }

    pub fn enrichment(&self) -> Option<&EnrichmentMetadata> {
        self.enrichment.as_ref()
    }
    /// Every field and cross-field rule this record breaks, sorted by field
    pub fn contract_violations(&self) -> Vec<FieldViolation> {
        let mut violations = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => violations_from("", &errors),
        };
        violations.extend(self.online_price.violations("online_price"));
        violations.extend(self.thrift_price.violations("thrift_price"));

        violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));
        violations
    }

    /// Annotate with the market lookup outcome
    pub(crate) fn with_enrichment(mut self, enrichment: EnrichmentMetadata) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    /// Text used to query marketplaces: first search query, else the most specific name
    pub fn market_query(&self) -> Option<String> {
        self.search_queries
            .iter()
            .chain([&self.name_ja_specific, &self.name_en_specific, &self.name_ja_generic])
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }
}
