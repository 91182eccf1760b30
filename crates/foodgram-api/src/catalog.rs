use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::present;
use crate::state::{AppState, blocking};

pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tags = blocking(&state, |db| Ok(db.list_tags()?)).await?;
    Ok(Json(tags.into_iter().map(present::tag).collect::<Vec<_>>()))
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let tag = blocking(&state, move |db| Ok(db.get_tag(id)?))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(present::tag(tag)))
}

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    /// Name prefix.
    pub name: Option<String>,
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, move |db| Ok(db.list_ingredients(query.name.as_deref())?)).await?;
    Ok(Json(rows.into_iter().map(present::ingredient).collect::<Vec<_>>()))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |db| Ok(db.get_ingredient(id)?))
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(present::ingredient(row)))
}
