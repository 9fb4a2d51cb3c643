use axum::{
    extract::{multipart::Field, rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::dto::{FinalRecipeResponse, ScanResponse, TextResponse};
use super::services::{self, ScanInput};
use crate::{error::AppError, llm::InlineImage, state::AppState};

pub fn pipeline_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/extract-text", post(extract_text))
        .route("/scan-food", post(scan_food))
        .route("/final-recipe", post(final_recipe))
        .layer(DefaultBodyLimit::max(upload_limit))
}

/// Parsed multipart upload: the image plus optional text fields.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub image: Option<InlineImage>,
    pub menu_text: Option<String>,
    pub user_text: Option<String>,
    pub zipcode: Option<String>,
}

pub(crate) fn is_valid_zipcode(zip: &str) -> bool {
    lazy_static! {
        static ref ZIP_RE: Regex = Regex::new(r"^[0-9]{5}$").unwrap();
    }
    ZIP_RE.is_match(zip)
}

async fn field_text(field: Field<'_>) -> Result<Option<String>, AppError> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::invalid(format!("unreadable form field: {e}")))?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// Reads the form. Requires a `file` part with a non-empty filename.
async fn read_upload(mut mp: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let mut saw_file_part = false;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::invalid(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                // a part without a filename attribute is a plain form value
                let Some(has_name) = field.file_name().map(|n| !n.is_empty()) else {
                    continue;
                };
                saw_file_part = true;
                if !has_name {
                    continue;
                }
                let mime_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let data: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::invalid(format!("unreadable file part: {e}")))?;
                form.image = Some(InlineImage { mime_type, data });
            }
            Some("menu_text") => form.menu_text = field_text(field).await?,
            Some("user_text") => form.user_text = field_text(field).await?,
            Some("zipcode") => form.zipcode = field_text(field).await?,
            _ => {}
        }
    }

    if !saw_file_part {
        return Err(AppError::invalid("No file part"));
    }
    if form.image.is_none() {
        return Err(AppError::invalid("No selected file"));
    }
    Ok(form)
}

/// POST /extract-text (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn extract_text(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<Json<TextResponse>, AppError> {
    let form = read_upload(mp).await?;
    let image = form.image.ok_or_else(|| AppError::invalid("No selected file"))?;

    let response = services::extract_menu_text(state.model.as_ref(), image).await?;
    info!(chars = response.len(), "menu text extracted");
    Ok(Json(TextResponse { response }))
}

/// POST /scan-food (multipart: `file`, optional `menu_text`, `user_text`, `zipcode`)
#[instrument(skip(state, mp))]
pub async fn scan_food(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<Json<ScanResponse>, AppError> {
    let form = read_upload(mp).await?;
    let image = form.image.ok_or_else(|| AppError::invalid("No selected file"))?;

    let zipcode = match form.zipcode {
        Some(zip) if is_valid_zipcode(&zip) => zip,
        Some(zip) => {
            warn!(%zip, "rejecting malformed zipcode");
            return Err(AppError::invalid(format!(
                "zipcode must be 5 digits, got {zip:?}"
            )));
        }
        None => state.config.default_zipcode.clone(),
    };

    let input = ScanInput {
        image,
        menu_text: form.menu_text,
        user_text: form.user_text,
        zipcode,
    };
    let response = services::run_scan(state.model.as_ref(), input).await?;
    Ok(Json(response))
}

/// POST /final-recipe (any JSON body)
#[instrument(skip(state, payload))]
pub async fn final_recipe(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<FinalRecipeResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "final-recipe body rejected");
        AppError::invalid("No valid input provided")
    })?;

    let (response, recipe) = services::final_recipe(state.model.as_ref(), &payload).await?;
    Ok(Json(FinalRecipeResponse { response, recipe }))
}
