//! Extractor accepting both body shapes served by the create and update
//! endpoints: a JSON document, or a multipart form with text fields plus an
//! optional `image` file.

use crate::api::recipes::payload::RawRecipePayload;
use crate::api::ErrorResponse;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

pub struct UploadedImage {
    pub data: Bytes,
    pub filename: String,
}

pub struct RecipeSubmission {
    pub payload: RawRecipePayload,
    pub image: Option<UploadedImage>,
}

impl FromRequest<AppState> for RecipeSubmission {
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|rejection| {
                    (
                        rejection.status(),
                        Json(ErrorResponse {
                            error: rejection.body_text(),
                        }),
                    )
                        .into_response()
                })?;
            from_multipart(multipart, state.config.max_upload_bytes).await
        } else {
            let Json(payload) = Json::<RawRecipePayload>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: format!("Invalid JSON body: {}", rejection.body_text()),
                        }),
                    )
                        .into_response()
                })?;
            Ok(Self {
                payload,
                image: None,
            })
        }
    }
}

async fn from_multipart(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<RecipeSubmission, Response> {
    let mut payload = RawRecipePayload::default();
    let mut image = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => payload.title = Some(Value::String(read_text(field).await?)),
            "ingredients" => payload.ingredients = Some(Value::String(read_text(field).await?)),
            "instructions" => payload.instructions = Some(Value::String(read_text(field).await?)),
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.len() > max_upload_bytes {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: format!(
                                "Image too large. Maximum size is {max_upload_bytes} bytes"
                            ),
                        }),
                    )
                        .into_response());
                }
                image = Some(UploadedImage { data, filename });
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    Ok(RecipeSubmission { payload, image })
}

async fn read_text(field: Field<'_>) -> Result<String, Response> {
    field.text().await.map_err(multipart_error)
}

fn multipart_error(e: MultipartError) -> Response {
    tracing::warn!("Multipart read error: {}", e);
    let error = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        "Request body too large".to_string()
    } else {
        format!("Failed to read multipart data: {}", e.body_text())
    };
    (e.status(), Json(ErrorResponse { error })).into_response()
}
