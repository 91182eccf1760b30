use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use foodgram_db::models::{RecipeDraft, UserRow};
use foodgram_db::queries::interactions::Collection;
use foodgram_db::{Database, DbError, RecipeFilter};
use foodgram_types::api::RecipeWriteRequest;

use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::middleware::{CurrentUser, Viewer};
use crate::pagination::Pager;
use crate::present;
use crate::state::{AppState, blocking};
use crate::validation;

/// Recipe list query. `tags` and `author` may repeat.
#[derive(Debug, Deserialize)]
pub struct RecipeQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Vec<Uuid>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

fn flag(field: &str, raw: Option<&str>) -> Result<bool, ApiError> {
    match raw {
        None => Ok(false),
        Some("1" | "true" | "True") => Ok(true),
        Some("0" | "false" | "False") => Ok(false),
        Some(_) => Err(ApiError::field(field, "Must be 0 or 1.")),
    }
}

impl RecipeQuery {
    fn filter(&self) -> Result<RecipeFilter, ApiError> {
        Ok(RecipeFilter {
            tags: self.tags.clone(),
            authors: self.author.clone(),
            is_favorited: flag("is_favorited", self.is_favorited.as_deref())?,
            is_in_shopping_cart: flag("is_in_shopping_cart", self.is_in_shopping_cart.as_deref())?,
        })
    }
}

pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: Viewer,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<RecipeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pager = Pager::new(query.page, query.limit, state.page_size)?;
    let filter = query.filter()?;
    let viewer_id = viewer.id().map(str::to_string);

    let (results, count) = blocking(&state, move |db| {
        let viewer = viewer_id.as_deref();
        let (rows, count) = db.list_recipes(&filter, viewer, pager.size, pager.offset())?;
        Ok((present::recipes(db, rows, viewer)?, count))
    })
    .await?;

    Ok(Json(pager.wrap(&uri, count, results)?))
}

pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer_id = viewer.id().map(str::to_string);
    let recipe = blocking(&state, move |db| {
        let row = db.get_recipe(id)?.ok_or(ApiError::NotFound)?;
        present::recipe(db, row, viewer_id.as_deref())
    })
    .await?;
    Ok(Json(recipe))
}

/// Shape checks first, then catalog existence against the database.
fn checked_draft(db: &Database, req: RecipeWriteRequest) -> Result<RecipeDraft, ApiError> {
    let draft = validation::recipe_draft(req)?;
    let (unknown_tags, unknown_ingredients) = db.unknown_catalog_ids(&draft)?;
    validation::unknown_catalog_ids(&unknown_tags, &unknown_ingredients)?;
    Ok(draft)
}

pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<RecipeWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = blocking(&state, move |db| {
        let draft = checked_draft(db, req)?;
        let id = db.create_recipe(&user.id, &draft)?;
        info!("Recipe {} '{}' created by {}", id, draft.name, user.username);
        let row = db.get_recipe(id)?.ok_or(ApiError::NotFound)?;
        present::recipe(db, row, Some(&user.id))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

fn authored_by(db: &Database, id: i64, user: &UserRow) -> Result<(), ApiError> {
    let row = db.get_recipe(id)?.ok_or(ApiError::NotFound)?;
    if row.author_id != user.id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

pub async fn update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<RecipeWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = blocking(&state, move |db| {
        authored_by(db, id, &user)?;
        let draft = checked_draft(db, req)?;
        db.update_recipe(id, &draft)?;
        info!("Recipe {} updated by {}", id, user.username);
        let row = db.get_recipe(id)?.ok_or(ApiError::NotFound)?;
        present::recipe(db, row, Some(&user.id))
    })
    .await?;
    Ok(Json(recipe))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, move |db| {
        authored_by(db, id, &user)?;
        db.delete_recipe(id)?;
        info!("Recipe {} deleted by {}", id, user.username);
        Ok(())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn already_added(collection: Collection) -> &'static str {
    match collection {
        Collection::Favorites => "The recipe is already in favorites.",
        Collection::ShoppingCart => "The recipe is already in the shopping cart.",
    }
}

fn not_added(collection: Collection) -> &'static str {
    match collection {
        Collection::Favorites => "The recipe is not in favorites.",
        Collection::ShoppingCart => "The recipe is not in the shopping cart.",
    }
}

async fn add_to(state: AppState, collection: Collection, user: UserRow, id: i64) -> Result<impl IntoResponse, ApiError> {
    let short = blocking(&state, move |db| {
        let row = db.add_to_collection(collection, &user.id, id).map_err(|e| match e {
            DbError::AlreadyExists(_) => ApiError::bad_request(already_added(collection)),
            other => other.into(),
        })?;
        Ok(present::recipe_short(&row))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(short)))
}

async fn remove_from(state: AppState, collection: Collection, user: UserRow, id: i64) -> Result<impl IntoResponse, ApiError> {
    let removed = blocking(&state, move |db| Ok(db.remove_from_collection(collection, &user.id, id)?)).await?;
    if !removed {
        return Err(ApiError::bad_request(not_added(collection)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    add_to(state, Collection::Favorites, user, id).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    remove_from(state, Collection::Favorites, user, id).await
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    add_to(state, Collection::ShoppingCart, user, id).await
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    remove_from(state, Collection::ShoppingCart, user, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        assert!(!flag("is_favorited", None).unwrap());
        assert!(flag("is_favorited", Some("1")).unwrap());
        assert!(flag("is_favorited", Some("true")).unwrap());
        assert!(!flag("is_favorited", Some("0")).unwrap());
        assert!(matches!(flag("is_favorited", Some("yes")), Err(ApiError::Validation(_))));
    }
}
