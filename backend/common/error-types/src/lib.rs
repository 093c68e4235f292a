//! Error taxonomy for the item analysis pipeline
//!
//! Every failure in the pipeline is normalized into one of a small, closed set of
//! [`ErrorKind`]s. The kind fixes the HTTP-style status, the machine code and the
//! default user-facing message, so an [`AppError`] always carries a valid
//! (kind, status, code) triple.
//!
//! # Design Principles
//!
//! 1. **Closed set**: `ErrorKind` is exhaustive, `classify` is total
//! 2. **Stable codes**: callers branch on `code()`, never on the message
//! 3. **No secrets**: technical detail stays in logs, users get localized text
//!
//! # Example
//! ```rust
//! use error_types::{classify_message, ErrorKind};
//!
//! let error = classify_message("429 Too Many Requests: quota exceeded");
//! assert_eq!(error.kind(), ErrorKind::RateLimit);
//! assert!(error.is_retryable());
//! ```

use serde::Serialize;
use std::fmt;

pub mod classify;
pub mod http;
pub mod validation;

pub use classify::{classify, classify_message, default_classifier, Classifier, KeywordRule};
pub use validation::FieldViolation;

/// Result type alias for pipeline operations
pub type AppResult<T> = Result<T, AppError>;

/// The fixed set of failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Required credential or setting missing
    Configuration,
    /// Provider quota or throughput exceeded
    RateLimit,
    /// Transport failure or timeout
    Network,
    /// Provider returned no usable response
    AIService,
    /// Image content not analyzable
    Analysis,
    /// Caller input violates a constraint
    Validation,
    /// Provider reply is not well-formed or schema-conformant
    Parse,
    /// Fallback
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::Configuration,
        ErrorKind::RateLimit,
        ErrorKind::Network,
        ErrorKind::AIService,
        ErrorKind::Analysis,
        ErrorKind::Validation,
        ErrorKind::Parse,
        ErrorKind::Unknown,
    ];

    pub fn http_status(&self) -> u16 {
        use http::status;
        match self {
            ErrorKind::Configuration => status::INTERNAL_SERVER_ERROR,
            ErrorKind::RateLimit => status::TOO_MANY_REQUESTS,
            ErrorKind::Network => status::SERVICE_UNAVAILABLE,
            ErrorKind::AIService => status::SERVICE_UNAVAILABLE,
            ErrorKind::Analysis => status::UNPROCESSABLE_ENTITY,
            ErrorKind::Validation => status::BAD_REQUEST,
            ErrorKind::Parse => status::UNPROCESSABLE_ENTITY,
            ErrorKind::Unknown => status::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::RateLimit => "RATE_LIMIT_ERROR",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::AIService => "AI_SERVICE_ERROR",
            ErrorKind::Analysis => "ANALYSIS_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Parse => "PARSE_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Localized, non-technical message shown to users
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => {
                "サーバーの設定に問題があります。管理者にお問い合わせください。"
            }
            ErrorKind::RateLimit => {
                "AIサービスの利用制限に達しました。しばらく待ってから再度お試しください。"
            }
            ErrorKind::Network => {
                "ネットワークエラーが発生しました。接続を確認して再度お試しください。"
            }
            ErrorKind::AIService => {
                "AIサービスから有効な応答がありませんでした。再度お試しください。"
            }
            ErrorKind::Analysis => "画像を解析できませんでした。別の画像でお試しください。",
            ErrorKind::Validation => "入力内容に問題があります。内容を確認してください。",
            ErrorKind::Parse => "AIの応答を解釈できませんでした。再度お試しください。",
            ErrorKind::Unknown => "予期しないエラーが発生しました。再度お試しください。",
        }
    }

    /// Transient kinds are expected to self-resolve on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimit | ErrorKind::Network | ErrorKind::AIService
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified pipeline error
///
/// Constructed only through the per-kind constructors, so status and code can never
/// disagree with the kind. The message may be replaced; the technical `detail` is for
/// logs and never shown to users.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{}] {}{}", .kind.code(), .message, detail_suffix(.detail))]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    detail: Option<String>,
    violations: Vec<FieldViolation>,
}

impl AppError {
    fn of(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            detail: None,
            violations: Vec::new(),
        }
    }

    pub fn configuration() -> Self {
        Self::of(ErrorKind::Configuration)
    }

    pub fn rate_limit() -> Self {
        Self::of(ErrorKind::RateLimit)
    }

    pub fn network() -> Self {
        Self::of(ErrorKind::Network)
    }

    pub fn ai_service() -> Self {
        Self::of(ErrorKind::AIService)
    }

    pub fn analysis() -> Self {
        Self::of(ErrorKind::Analysis)
    }

    pub fn validation() -> Self {
        Self::of(ErrorKind::Validation)
    }

    pub fn parse() -> Self {
        Self::of(ErrorKind::Parse)
    }

    pub fn unknown() -> Self {
        Self::of(ErrorKind::Unknown)
    }

    /// Replace the user-facing message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach technical detail for logs
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach field-level violations
    pub fn with_violations(mut self, violations: Vec<FieldViolation>) -> Self {
        self.violations = violations;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Expected failures; `Unknown` means something we did not anticipate
    pub fn is_operational(&self) -> bool {
        self.kind != ErrorKind::Unknown
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_transient()
    }

    /// Log error with a level matching its kind
    pub fn log(&self) {
        let detail = self.detail.as_deref().unwrap_or("");
        match self.kind {
            ErrorKind::Validation | ErrorKind::Analysis => {
                tracing::info!(code = self.code(), detail, "Client error");
            }
            ErrorKind::RateLimit | ErrorKind::Network | ErrorKind::AIService => {
                tracing::warn!(code = self.code(), detail, "Provider issue");
            }
            ErrorKind::Parse => {
                tracing::warn!(
                    code = self.code(),
                    detail,
                    violations = self.violations.len(),
                    "Provider contract violation"
                );
            }
            ErrorKind::Configuration | ErrorKind::Unknown => {
                tracing::error!(code = self.code(), detail, "Server error");
            }
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

impl resilience::Retryable for AppError {
    fn is_retryable(&self) -> bool {
        AppError::is_retryable(self)
    }
}
