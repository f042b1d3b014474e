use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ImageInput, InputRequest, SchedulePayload};
use crate::state::AppState;

const NO_INPUT_MESSAGE: &str = "No input provided";
const NOT_AN_IMAGE_MESSAGE: &str = "Only image uploads are allowed.";
const TOO_LARGE_MESSAGE: &str = "File too large";
const EXTRA_IMAGE_MESSAGE: &str = "Only one image upload is allowed.";

// POST /api/schedule
pub async fn schedule(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let request_id = Uuid::new_v4();

    let input = match read_input(&state, request).await {
        Ok(input) if !input.is_empty() => input,
        Ok(_) => {
            tracing::info!(request_id = %request_id, "schedule request without text or image");
            return AppError::BadRequest(NO_INPUT_MESSAGE.to_string()).into_response();
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "rejected schedule request");
            return e.into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        text = %input.raw_text(),
        has_image = input.image.is_some(),
        "incoming schedule request"
    );

    match state.extractor.process(&input).await {
        Ok(result) => {
            tracing::info!(request_id = %request_id, shape = ?result.shape(), "schedule request handled");
            Json(result).into_response()
        }
        Err(source) => {
            tracing::error!(request_id = %request_id, error = %source, "extraction failed");
            AppError::Extraction {
                source,
                raw_text: input.raw_text().to_string(),
            }
            .into_response()
        }
    }
}

async fn read_input(state: &AppState, request: Request) -> Result<InputRequest, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return read_multipart(multipart, state.config.max_upload_bytes).await;
    }

    if content_type.starts_with("application/json") {
        let Json(payload) = Json::<SchedulePayload>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(InputRequest::new(payload.text.as_deref(), None));
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(payload) = Form::<SchedulePayload>::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(InputRequest::new(payload.text.as_deref(), None));
    }

    Ok(InputRequest::default())
}

async fn read_multipart(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<InputRequest, AppError> {
    let mut text: Option<String> = None;
    let mut image: Option<ImageInput> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "text" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                text = Some(value);
            }
            "image" => {
                // Browsers send an empty, unnamed part when no file was picked.
                if field.file_name() == Some("") {
                    continue;
                }
                if image.is_some() {
                    return Err(AppError::BadRequest(EXTRA_IMAGE_MESSAGE.to_string()));
                }

                let media_type = field.content_type().map(str::to_string);
                if !media_type
                    .as_deref()
                    .is_some_and(|m| m.starts_with("image/"))
                {
                    return Err(AppError::BadRequest(NOT_AN_IMAGE_MESSAGE.to_string()));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if bytes.len() > max_upload_bytes {
                    return Err(AppError::BadRequest(TOO_LARGE_MESSAGE.to_string()));
                }

                image = Some(ImageInput {
                    bytes: bytes.to_vec(),
                    media_type,
                });
            }
            _ => {}
        }
    }

    Ok(InputRequest::new(text.as_deref(), image))
}
