use crate::api::recipes::form::RecipeSubmission;
use crate::api::recipes::payload::{validate, RawRecipePayload};
use crate::api::recipes::RecipeResponse;
use crate::api::{ErrorResponse, ValidationErrorResponse};
use crate::images::ImageError;
use crate::store;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    put,
    path = "/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    request_body = RawRecipePayload,
    responses(
        (status = 200, description = "Updated recipe", body = RecipeResponse),
        (status = 400, description = "Malformed id or validation failure", body = ValidationErrorResponse),
        (status = 404, description = "No such recipe", body = ErrorResponse)
    )
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    submission: RecipeSubmission,
) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid id".to_string(),
            }),
        )
            .into_response();
    };

    let payload = match validate(&submission.payload) {
        Ok(payload) => payload,
        Err(details) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorResponse {
                    error: "Invalid payload".to_string(),
                    details,
                }),
            )
                .into_response()
        }
    };

    // Without a new image the stored image_url stays as it is
    let image_url = match submission.image {
        Some(image) => {
            let Some(images) = state.images.as_ref() else {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Image storage unavailable".to_string(),
                    }),
                )
                    .into_response();
            };
            match images.upload(&image.data, &image.filename).await {
                Ok(url) => Some(url),
                Err(ImageError::UnsupportedType) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse {
                            error: "Unsupported image type".to_string(),
                        }),
                    )
                        .into_response()
                }
                Err(e) => {
                    tracing::error!("Image upload failed: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            error: "Update failed".to_string(),
                        }),
                    )
                        .into_response();
                }
            }
        }
        None => None,
    };

    match store::update(
        &state.pool,
        id,
        &payload.title,
        &payload.ingredients,
        &payload.instructions,
        image_url.as_deref(),
    ) {
        Ok(Some(recipe)) => (StatusCode::OK, Json(RecipeResponse::from(recipe))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to update recipe: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Update failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}
