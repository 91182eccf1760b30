//! Row -> response conversion. Everything here runs inside
//! [`crate::state::blocking`] and batches its lookups per page of rows.

use std::collections::{HashMap, HashSet};

use tracing::warn;
use uuid::Uuid;

use foodgram_db::Database;
use foodgram_db::models::{IngredientRow, RecipeRow, TagRow, UserRow};
use foodgram_db::queries::interactions::Collection;
use foodgram_types::api::{
    RecipeIngredientResponse, RecipeResponse, RecipeShort, SubscriptionResponse, UserResponse,
};
use foodgram_types::models::{Ingredient, Tag};

use crate::error::ApiError;

fn parse_user_id(id: &str) -> Uuid {
    id.parse().unwrap_or_else(|e| {
        warn!("Corrupt user id '{}': {}", id, e);
        Uuid::default()
    })
}

pub fn tag(row: TagRow) -> Tag {
    Tag {
        id: row.id,
        name: row.name,
        color: row.color,
        slug: row.slug,
    }
}

pub fn ingredient(row: IngredientRow) -> Ingredient {
    Ingredient {
        id: row.id,
        name: row.name,
        measurement_unit: row.measurement_unit,
    }
}

pub fn user(row: &UserRow, is_subscribed: bool) -> UserResponse {
    UserResponse {
        email: row.email.clone(),
        id: parse_user_id(&row.id),
        username: row.username.clone(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        is_subscribed,
    }
}

pub fn recipe_short(row: &RecipeRow) -> RecipeShort {
    RecipeShort {
        id: row.id,
        name: row.name.clone(),
        image: row.image.clone(),
        cooking_time: row.cooking_time,
    }
}

/// Users annotated with whether the viewer follows each of them.
pub fn users(db: &Database, rows: &[UserRow], viewer: Option<&str>) -> Result<Vec<UserResponse>, ApiError> {
    let ids: Vec<String> = rows.iter().map(|u| u.id.clone()).collect();
    let followed = match viewer {
        Some(viewer) => db.followed_among(viewer, &ids)?,
        None => HashSet::new(),
    };
    Ok(rows.iter().map(|row| user(row, followed.contains(&row.id))).collect())
}

/// Full recipe representations, in the order of `rows`.
pub fn recipes(db: &Database, rows: Vec<RecipeRow>, viewer: Option<&str>) -> Result<Vec<RecipeResponse>, ApiError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
    for (recipe_id, row) in db.recipe_tags(&ids)? {
        tags.entry(recipe_id).or_default().push(tag(row));
    }

    let mut lines: HashMap<i64, Vec<RecipeIngredientResponse>> = HashMap::new();
    for line in db.recipe_ingredients(&ids)? {
        lines.entry(line.recipe_id).or_default().push(RecipeIngredientResponse {
            id: line.ingredient_id,
            name: line.name,
            measurement_unit: line.measurement_unit,
            amount: line.amount,
        });
    }

    let mut author_ids: Vec<String> = rows.iter().map(|r| r.author_id.clone()).collect();
    author_ids.sort();
    author_ids.dedup();
    let author_rows = db.get_users(&author_ids)?;
    let authors: HashMap<String, UserResponse> = users(db, &author_rows, viewer)?
        .into_iter()
        .zip(author_rows.iter())
        .map(|(response, row)| (row.id.clone(), response))
        .collect();

    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            db.collection_members(Collection::Favorites, viewer, &ids)?,
            db.collection_members(Collection::ShoppingCart, viewer, &ids)?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    rows.into_iter()
        .map(|row| {
            let author = authors.get(&row.author_id).cloned().ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!("recipe {} has no author row", row.id))
            })?;
            Ok(RecipeResponse {
                id: row.id,
                tags: tags.remove(&row.id).unwrap_or_default(),
                author,
                ingredients: lines.remove(&row.id).unwrap_or_default(),
                is_favorited: favorited.contains(&row.id),
                is_in_shopping_cart: in_cart.contains(&row.id),
                name: row.name,
                image: row.image,
                text: row.text,
                cooking_time: row.cooking_time,
            })
        })
        .collect()
}

pub fn recipe(db: &Database, row: RecipeRow, viewer: Option<&str>) -> Result<RecipeResponse, ApiError> {
    recipes(db, vec![row], viewer)?
        .pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("recipe vanished while rendering")))
}

/// Followed authors with their recipe counts and latest recipes.
pub fn subscriptions(
    db: &Database,
    authors: &[UserRow],
    recipes_limit: Option<u32>,
) -> Result<Vec<SubscriptionResponse>, ApiError> {
    let ids: Vec<String> = authors.iter().map(|u| u.id.clone()).collect();
    let mut previews = db.author_previews(&ids, recipes_limit)?;

    Ok(authors
        .iter()
        .map(|author| {
            let preview = previews.remove(&author.id).unwrap_or_default();
            SubscriptionResponse {
                user: user(author, true),
                recipes: preview.recipes.iter().map(recipe_short).collect(),
                recipes_count: preview.recipes_count,
            }
        })
        .collect())
}
