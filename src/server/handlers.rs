//! Request handlers for the two services.

use super::error::ApiError;
use super::{CsvState, RentRollState};
use crate::convert;
use crate::output::{CsvOutcome, RentRollSummary, CSV_FILENAME, NO_TABLES_MESSAGE};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Multipart field carrying the uploaded PDF.
pub const UPLOAD_FIELD: &str = "file";

/// Body of `POST /extracttable`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractTableRequest {
    pub pdf_url: String,
}

/// `POST /extracttable`: fetch a PDF and return its rent-roll summary.
///
/// Runs behind [`super::auth::require_internal_token`].
pub async fn extract_rent_roll(
    State(state): State<RentRollState>,
    payload: Result<Json<ExtractTableRequest>, JsonRejection>,
) -> Result<Json<RentRollSummary>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Unprocessable(e.body_text()))?;

    let summary = convert::rent_roll_from_url(
        &request.pdf_url,
        &state.extractor,
        state.generator.as_ref(),
        &state.config,
    )
    .await?;

    Ok(Json(summary))
}

/// `POST /extract-tables/`: merge every table of an uploaded PDF into a CSV.
pub async fn extract_tables_csv(
    State(state): State<CsvState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;

    match convert::tables_csv_from_upload(&upload, &state.extractor).await? {
        CsvOutcome::NoTables => Ok(Json(json!({ "message": NO_TABLES_MESSAGE })).into_response()),
        CsvOutcome::Csv { body, .. } => Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", CSV_FILENAME),
                ),
            ],
            body,
        )
            .into_response()),
    }
}

/// Read the bytes of the `file` field, skipping any other fields.
async fn read_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        debug!("Upload received: {:?}", field.file_name());
        return field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(e.body_text()));
    }

    Err(ApiError::Unprocessable(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    )))
}
