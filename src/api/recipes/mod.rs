pub mod create;
pub mod delete;
pub mod form;
pub mod get;
pub mod list;
pub mod payload;
pub mod update;

use crate::models::Recipe;
use crate::AppState;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Wire representation of a stored recipe, shared by every endpoint that
/// returns one.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    /// Absolute URL, or empty when no image was ever supplied
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            ingredients: recipe.ingredients.into_iter().flatten().collect(),
            instructions: recipe.instructions,
            image_url: recipe.image_url,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

/// Returns the router for /recipes endpoints (mounted at /recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
    ),
    components(schemas(
        RecipeResponse,
        list::ListRecipesResponse,
        payload::RawRecipePayload,
    ))
)]
pub struct ApiDoc;
