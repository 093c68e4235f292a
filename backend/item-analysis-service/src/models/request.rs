//! Analysis input and its admission checks
use bytes::Bytes;
use error_types::{AppError, AppResult};
use std::fmt;

/// Largest accepted upload
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Image formats the provider accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
}

impl MediaType {
    /// Parse a declared MIME type; `image/jpg` is accepted as an alias
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "image/webp" => Some(MediaType::Webp),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Webp => "image/webp",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Caller choices for one analysis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisOptions {
    /// Use the higher-quality model and stricter instructions
    pub precision_mode: bool,
    /// Attempt the market-price lookup after the primary analysis
    pub enable_enrichment: bool,
    /// Municipality code used for disposal-cost guidance
    pub region_code: Option<String>,
}

impl AnalysisOptions {
    /// Set the region from raw input; blank input means no region
    pub fn with_region_code(mut self, raw: Option<&str>) -> Self {
        self.region_code = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }
}

/// One uploaded image plus options
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: Bytes,
    /// Declared MIME type from the upload
    pub media_type: String,
    pub byte_length: u64,
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    pub fn new(image: Bytes, media_type: impl Into<String>, options: AnalysisOptions) -> Self {
        let byte_length = image.len() as u64;
        Self {
            image,
            media_type: media_type.into(),
            byte_length,
            options,
        }
    }

    /// Admission checks, run before any credential lookup or provider call
    pub fn validate(&self) -> AppResult<MediaType> {
        let media_type = MediaType::parse(&self.media_type).ok_or_else(|| {
            AppError::validation()
                .with_message("対応していない画像形式です。JPEG、PNG、WebPのいずれかを選択してください。")
                .with_detail(format!("unsupported media type: {}", self.media_type))
        })?;

        if self.byte_length == 0 || self.image.is_empty() {
            return Err(AppError::validation()
                .with_message("画像ファイルが空です。別の画像を選択してください。")
                .with_detail("empty upload"));
        }

        if self.byte_length > MAX_IMAGE_BYTES {
            return Err(AppError::validation()
                .with_message("ファイルサイズが大きすぎます。10MB以下の画像を選択してください。")
                .with_detail(format!(
                    "upload of {} bytes exceeds {} bytes",
                    self.byte_length, MAX_IMAGE_BYTES
                )));
        }

        if let Some(region) = &self.options.region_code {
            if region.trim().is_empty() || region.trim() != region {
                return Err(AppError::validation()
                    .with_message("入力内容に問題があります。地域コードを確認してください。")
                    .with_detail("region code must be trimmed and non-empty"));
            }
        }

        Ok(media_type)
    }
}
