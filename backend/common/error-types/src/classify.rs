//! Keyword classification of opaque errors
//!
//! Provider SDKs and transports only give us a message string. The rules below map
//! message fragments to an [`ErrorKind`]; they are data, so new vocabulary can be
//! added without touching the retry logic.
//!
//! Matching is case-insensitive substring search. Rules are tried in order,
//! localized phrases first (messages we produced ourselves deeper in the stack), then
//! raw provider vocabulary. The first matching rule wins.

use crate::{AppError, ErrorKind};
use std::sync::OnceLock;

/// One row of the keyword table
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub kind: ErrorKind,
    /// Lowercase fragments; any one of them selects `kind`
    pub keywords: &'static [&'static str],
}

impl KeywordRule {
    pub const fn new(kind: ErrorKind, keywords: &'static [&'static str]) -> Self {
        Self { kind, keywords }
    }

    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k))
    }
}

/// Phrases from the localized default messages
pub const LOCALIZED_RULES: &[KeywordRule] = &[
    KeywordRule::new(ErrorKind::Configuration, &["設定に問題", "apiキー"]),
    KeywordRule::new(ErrorKind::RateLimit, &["利用制限"]),
    KeywordRule::new(ErrorKind::Network, &["ネットワーク", "タイムアウト"]),
    KeywordRule::new(ErrorKind::AIService, &["有効な応答"]),
    KeywordRule::new(
        ErrorKind::Validation,
        &["入力内容", "ファイルサイズ", "画像ファイル", "対応していない"],
    ),
    KeywordRule::new(ErrorKind::Parse, &["解釈できません"]),
    KeywordRule::new(ErrorKind::Analysis, &["解析できません"]),
];

/// Vocabulary seen in raw provider and transport errors
pub const PROVIDER_RULES: &[KeywordRule] = &[
    KeywordRule::new(
        ErrorKind::Configuration,
        &[
            "api key",
            "api_key",
            "apikey",
            "authentication",
            "unauthorized",
            "permission denied",
        ],
    ),
    KeywordRule::new(
        ErrorKind::RateLimit,
        &["quota", "rate limit", "rate_limit", "too many requests", "429"],
    ),
    KeywordRule::new(
        ErrorKind::Network,
        &["timeout", "timed out", "network", "fetch", "connection"],
    ),
    KeywordRule::new(ErrorKind::AIService, &["empty", "no response"]),
    KeywordRule::new(ErrorKind::Parse, &["parse", "invalid", "malformed"]),
    KeywordRule::new(ErrorKind::Analysis, &["analysis", "cannot process"]),
];

/// Ordered keyword table
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<KeywordRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            rules: LOCALIZED_RULES
                .iter()
                .chain(PROVIDER_RULES.iter())
                .copied()
                .collect(),
        }
    }
}

impl Classifier {
    /// Append a rule after the built-in ones
    pub fn with_rule(mut self, rule: KeywordRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Kind selected by the first matching rule, `Unknown` otherwise
    pub fn kind_for(&self, message: &str) -> ErrorKind {
        let haystack = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&haystack))
            .map(|rule| rule.kind)
            .unwrap_or(ErrorKind::Unknown)
    }

    /// Classify an arbitrary error; an `AppError` anywhere in the chain is returned as is
    pub fn classify<E>(&self, err: E) -> AppError
    where
        E: Into<anyhow::Error>,
    {
        let err: anyhow::Error = err.into();
        if let Some(app) = err.chain().find_map(|e| e.downcast_ref::<AppError>()) {
            return app.clone();
        }

        let message = format!("{:#}", err);
        self.classify_message(&message)
    }

    pub fn classify_message(&self, message: &str) -> AppError {
        let error = match self.kind_for(message) {
            ErrorKind::Configuration => AppError::configuration(),
            ErrorKind::RateLimit => AppError::rate_limit(),
            ErrorKind::Network => AppError::network(),
            ErrorKind::AIService => AppError::ai_service(),
            ErrorKind::Analysis => AppError::analysis(),
            ErrorKind::Validation => AppError::validation(),
            ErrorKind::Parse => AppError::parse(),
            ErrorKind::Unknown => AppError::unknown(),
        };

        if message.is_empty() {
            error
        } else {
            error.with_detail(message)
        }
    }
}

/// The built-in keyword table, built once
pub fn default_classifier() -> &'static Classifier {
    static DEFAULT: OnceLock<Classifier> = OnceLock::new();
    DEFAULT.get_or_init(Classifier::default)
}

/// Classify any error with the built-in keyword table
pub fn classify<E>(err: E) -> AppError
where
    E: Into<anyhow::Error>,
{
    default_classifier().classify(err)
}

/// Classify a bare message (non-error values, strings from foreign layers)
pub fn classify_message(message: &str) -> AppError {
    default_classifier().classify_message(message)
}
