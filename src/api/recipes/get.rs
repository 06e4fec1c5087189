use crate::api::recipes::RecipeResponse;
use crate::api::ErrorResponse;
use crate::store;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No such recipe", body = ErrorResponse)
    )
)]
pub async fn get_recipe(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    // A malformed identifier is a caller error, distinct from a missing record
    let Ok(id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid id".to_string(),
            }),
        )
            .into_response();
    };

    match store::get(&state.pool, id) {
        Ok(Some(recipe)) => (StatusCode::OK, Json(RecipeResponse::from(recipe))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal Server Error".to_string(),
                }),
            )
                .into_response()
        }
    }
}
