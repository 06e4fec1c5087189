//! Persistence adapter for the `recipes` collection.
//!
//! Handlers never build queries themselves; they go through these functions
//! so the filter construction and error context live in one place. All
//! functions check a connection out of the pool and return dependency faults
//! as `anyhow` errors for the handler boundary to convert into 500s.

use crate::db::DbPool;
use crate::models::{NewRecipe, Recipe, RecipeChanges};
use crate::schema::recipes;
use anyhow::{Context, Result};
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use uuid::Uuid;

/// Base query with the optional search filter applied. `pattern` is an
/// already-escaped LIKE pattern (see `api::recipes::list::search_pattern`);
/// it is matched case-insensitively against the title, the instructions, and
/// every ingredient, OR-combined.
fn filtered(pattern: Option<String>) -> recipes::BoxedQuery<'static, Pg> {
    let mut query = recipes::table.into_boxed();
    if let Some(pattern) = pattern {
        query = query.filter(
            recipes::title
                .ilike(pattern.clone())
                .or(recipes::instructions.ilike(pattern.clone()))
                .or(sql::<Bool>(
                    "EXISTS (SELECT 1 FROM unnest(ingredients) AS ingredient WHERE ingredient ILIKE ",
                )
                .bind::<Text, _>(pattern)
                .sql(")")),
        );
    }
    query
}

pub fn find(pool: &DbPool, pattern: Option<String>, limit: i64, offset: i64) -> Result<Vec<Recipe>> {
    let mut conn = pool.get().context("database connection unavailable")?;
    filtered(pattern)
        .order(recipes::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Recipe::as_select())
        .load(&mut conn)
        .context("failed to load recipes")
}

pub fn count(pool: &DbPool, pattern: Option<String>) -> Result<i64> {
    let mut conn = pool.get().context("database connection unavailable")?;
    filtered(pattern)
        .count()
        .get_result(&mut conn)
        .context("failed to count recipes")
}

pub fn get(pool: &DbPool, id: Uuid) -> Result<Option<Recipe>> {
    let mut conn = pool.get().context("database connection unavailable")?;
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
        .optional()
        .context("failed to fetch recipe")
}

pub fn create(
    pool: &DbPool,
    title: &str,
    ingredients: &[String],
    instructions: &str,
    image_url: &str,
) -> Result<Recipe> {
    let mut conn = pool.get().context("database connection unavailable")?;
    let ingredients: Vec<Option<String>> = ingredients.iter().cloned().map(Some).collect();
    diesel::insert_into(recipes::table)
        .values(&NewRecipe {
            title,
            ingredients: &ingredients,
            instructions,
            image_url,
        })
        .returning(Recipe::as_returning())
        .get_result(&mut conn)
        .context("failed to insert recipe")
}

/// Replaces title, ingredients and instructions; `image_url` is only written
/// when `Some` (a new image was uploaded). `updated_at` is refreshed by the
/// database trigger.
pub fn update(
    pool: &DbPool,
    id: Uuid,
    title: &str,
    ingredients: &[String],
    instructions: &str,
    image_url: Option<&str>,
) -> Result<Option<Recipe>> {
    let mut conn = pool.get().context("database connection unavailable")?;
    let ingredients: Vec<Option<String>> = ingredients.iter().cloned().map(Some).collect();
    diesel::update(recipes::table.find(id))
        .set(&RecipeChanges {
            title,
            ingredients: &ingredients,
            instructions,
            image_url,
        })
        .returning(Recipe::as_returning())
        .get_result(&mut conn)
        .optional()
        .context("failed to update recipe")
}

pub fn delete(pool: &DbPool, id: Uuid) -> Result<Option<Recipe>> {
    let mut conn = pool.get().context("database connection unavailable")?;
    diesel::delete(recipes::table.find(id))
        .returning(Recipe::as_returning())
        .get_result(&mut conn)
        .optional()
        .context("failed to delete recipe")
}

pub fn clear(pool: &DbPool) -> Result<usize> {
    let mut conn = pool.get().context("database connection unavailable")?;
    diesel::delete(recipes::table)
        .execute(&mut conn)
        .context("failed to clear recipes")
}

/// Cheap liveness probe for the health endpoint.
pub fn ping(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().context("database connection unavailable")?;
    diesel::sql_query("SELECT 1")
        .execute(&mut conn)
        .context("database ping failed")?;
    Ok(())
}
