use crate::api::recipes::form::RecipeSubmission;
use crate::api::recipes::payload::{validate, RawRecipePayload};
use crate::api::recipes::RecipeResponse;
use crate::api::{ErrorResponse, ValidationErrorResponse};
use crate::images::ImageError;
use crate::store;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/recipes",
    tag = "recipes",
    request_body = RawRecipePayload,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation failure", body = ValidationErrorResponse),
        (status = 500, description = "Store or image provider fault", body = ErrorResponse)
    )
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    submission: RecipeSubmission,
) -> impl IntoResponse {
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
                Ok(url) => url,
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
                            error: "Create failed".to_string(),
                        }),
                    )
                        .into_response();
                }
            }
        }
        None => String::new(),
    };

    match store::create(
        &state.pool,
        &payload.title,
        &payload.ingredients,
        &payload.instructions,
        &image_url,
    ) {
        Ok(recipe) => (StatusCode::CREATED, Json(RecipeResponse::from(recipe))).into_response(),
        Err(e) => {
            tracing::error!("Failed to create recipe: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Create failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}
