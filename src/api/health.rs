use crate::store;
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    /// "up" when the store answers a probe query, otherwise "down"
    pub store_status: String,
    pub image_provider_configured: bool,
    pub env: String,
    pub time: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let pool = state.pool.clone();
    let store_up = tokio::task::spawn_blocking(move || store::ping(&pool).is_ok())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        ok: true,
        store_status: (if store_up { "up" } else { "down" }).to_string(),
        image_provider_configured: state.images.is_some(),
        env: state.config.app_env.clone(),
        time: Utc::now(),
    })
}

#[derive(OpenApi)]
#[openapi(paths(healthz), components(schemas(HealthResponse)))]
pub struct ApiDoc;
