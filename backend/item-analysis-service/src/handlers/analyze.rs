//! `POST /api/analyze`: multipart upload -> item analysis
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use bytes::{Bytes, BytesMut};
use error_types::AppError;
use futures_util::stream::StreamExt;
use tracing::{debug, instrument};

use super::response::{AnalysisEnvelope, ApiError};
use crate::config::{Config, CredentialSource};
use crate::models::{AnalysisOptions, AnalysisRequest, MAX_IMAGE_BYTES};
use crate::services::ItemAnalyzer;

/// Upload form fields
const FIELD_IMAGE: &str = "image";
const FIELD_PRECISION: &str = "precisionMode";
const FIELD_ENRICHMENT: &str = "exaSearch";
const FIELD_REGION: &str = "municipalityCode";

/// Text fields are flags or short codes
const MAX_TEXT_FIELD_BYTES: usize = 1024;

#[instrument(skip_all)]
pub async fn analyze_item(
    analyzer: web::Data<ItemAnalyzer>,
    credentials: web::Data<dyn CredentialSource>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let request = read_upload(payload).await?;
    let credentials = credentials.load();

    let analysis = analyzer
        .analyze_with_deadline(&request, &credentials, config.analysis_deadline())
        .await?;

    Ok(HttpResponse::Ok().json(AnalysisEnvelope::new(analysis)))
}

struct UploadedImage {
    data: Bytes,
    media_type: String,
    /// Bytes seen on the wire; may exceed `data.len()` when the upload was cut off
    byte_length: u64,
}

/// Collect the multipart fields into an [`AnalysisRequest`]
///
/// The image is buffered up to one byte past the limit, enough for admission checks
/// to reject it without reading an arbitrarily large body.
async fn read_upload(mut payload: Multipart) -> Result<AnalysisRequest, AppError> {
    let mut image: Option<UploadedImage> = None;
    let mut options = AnalysisOptions::default();
    let mut region: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            AppError::validation().with_detail(format!("malformed multipart body: {}", e))
        })?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            FIELD_IMAGE => {
                let media_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_default();
                let (data, byte_length) = read_field(&mut field, MAX_IMAGE_BYTES as usize + 1).await?;
                image = Some(UploadedImage {
                    data,
                    media_type,
                    byte_length,
                });
            }
            FIELD_PRECISION => options.precision_mode = parse_flag(&read_text(&mut field).await?),
            FIELD_ENRICHMENT => options.enable_enrichment = parse_flag(&read_text(&mut field).await?),
            FIELD_REGION => region = Some(read_text(&mut field).await?),
            other => {
                debug!(field = other, "Ignoring unknown multipart field");
                read_field(&mut field, 0).await?;
            }
        }
    }

    let image = image.ok_or_else(|| {
        AppError::validation()
            .with_message("画像ファイルが必要です。写真を撮影するか選択してください。")
            .with_detail("multipart body has no image field")
    })?;

    let options = options.with_region_code(region.as_deref());
    Ok(AnalysisRequest {
        image: image.data,
        media_type: image.media_type,
        byte_length: image.byte_length,
        options,
    })
}

/// Read a field, keeping at most `limit` bytes; stops reading once the limit is passed
async fn read_field(field: &mut Field, limit: usize) -> Result<(Bytes, u64), AppError> {
    let mut buffer = BytesMut::new();
    let mut total: u64 = 0;

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| {
            AppError::validation().with_detail(format!("error reading upload field: {}", e))
        })?;
        total += chunk.len() as u64;

        let room = limit.saturating_sub(buffer.len());
        buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if limit > 0 && total >= limit as u64 {
            break;
        }
    }

    Ok((buffer.freeze(), total))
}

async fn read_text(field: &mut Field) -> Result<String, AppError> {
    let (data, total) = read_field(field, MAX_TEXT_FIELD_BYTES).await?;
    if total > MAX_TEXT_FIELD_BYTES as u64 {
        return Err(AppError::validation().with_detail("form field too long"));
    }
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
