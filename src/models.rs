use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<Option<String>>,
    pub instructions: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub title: &'a str,
    pub ingredients: &'a [Option<String>],
    pub instructions: &'a str,
    pub image_url: &'a str,
}

/// Full field replace on update, except `image_url` which is only touched
/// when a new image was uploaded.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChanges<'a> {
    pub title: &'a str,
    pub ingredients: &'a [Option<String>],
    pub instructions: &'a str,
    pub image_url: Option<&'a str>,
}
