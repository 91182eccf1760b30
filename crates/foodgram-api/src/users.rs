use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use foodgram_db::DbError;
use foodgram_db::models::NewUser;
use foodgram_types::api::{RegisterRequest, RegisterResponse, SetPasswordRequest};

use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::middleware::{CurrentUser, Viewer};
use crate::pagination::Pager;
use crate::present;
use crate::state::{AppState, blocking};
use crate::validation;

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();
    Ok(hash)
}

fn password_matches(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| anyhow::anyhow!("stored hash is unreadable: {e}"))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub recipes_limit: Option<String>,
}

fn recipes_limit(raw: Option<&str>) -> Result<Option<u32>, ApiError> {
    raw.map(|value| {
        value
            .parse::<u32>()
            .map_err(|_| ApiError::field("recipes_limit", "A valid non-negative integer is required."))
    })
    .transpose()
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::registration(&req)?;

    let user_id = Uuid::new_v4();
    let response = blocking(&state, move |db| {
        let password_hash = hash_password(&req.password)?;
        let id = user_id.to_string();
        db.create_user(&NewUser {
            id: &id,
            email: &req.email,
            username: &req.username,
            first_name: &req.first_name,
            last_name: &req.last_name,
            password_hash: &password_hash,
        })
        .map_err(|e| match e {
            e if e.is_duplicate_of("users.email") => {
                ApiError::field("email", "A user with that email already exists.")
            }
            e if e.is_duplicate_of("users.username") => {
                ApiError::field("username", "A user with that username already exists.")
            }
            other => other.into(),
        })?;

        Ok(RegisterResponse {
            email: req.email,
            id: user_id,
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
        })
    })
    .await?;

    info!("Registered user {} ({})", response.username, response.id);
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_users(
    State(state): State<AppState>,
    viewer: Viewer,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pager = Pager::new(query.page, query.limit, state.page_size)?;
    let viewer_id = viewer.id().map(str::to_string);

    let (results, count) = blocking(&state, move |db| {
        let (rows, count) = db.list_users(pager.size, pager.offset())?;
        Ok((present::users(db, &rows, viewer_id.as_deref())?, count))
    })
    .await?;

    Ok(Json(pager.wrap(&uri, count, results)?))
}

pub async fn get_user(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer_id = viewer.id().map(str::to_string);
    let user = blocking(&state, move |db| {
        let row = db.get_user(&id.to_string())?.ok_or(ApiError::NotFound)?;
        let mut users = present::users(db, std::slice::from_ref(&row), viewer_id.as_deref())?;
        users.pop().ok_or(ApiError::NotFound)
    })
    .await?;
    Ok(Json(user))
}

pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(present::user(&user, false))
}

pub async fn set_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::password_strength(&req.new_password).map_err(|message| ApiError::field("new_password", message))?;

    let username = user.username.clone();
    blocking(&state, move |db| {
        if !password_matches(&req.current_password, &user.password)? {
            return Err(ApiError::field("current_password", "Current password is incorrect."));
        }
        if req.current_password == req.new_password {
            return Err(ApiError::field(
                "new_password",
                "The new password must differ from the current one.",
            ));
        }
        let hash = hash_password(&req.new_password)?;
        db.set_password_hash(&user.id, &hash)?;
        Ok(())
    })
    .await?;

    info!("Password changed for {}", username);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<Uuid>,
    Query(query): Query<SubscriptionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = recipes_limit(query.recipes_limit.as_deref())?;
    let author_id = author_id.to_string();
    if author_id == user.id {
        return Err(ApiError::bad_request("You cannot subscribe to yourself."));
    }

    let follower_id = user.id.clone();
    let mut annotated = blocking(&state, move |db| {
        let author = db.follow(&follower_id, &author_id).map_err(|e| match e {
            DbError::AlreadyExists(_) => ApiError::bad_request("You are already subscribed to this author."),
            DbError::Constraint(detail) => {
                warn!("Follow rejected: {}", detail);
                ApiError::bad_request("You cannot subscribe to yourself.")
            }
            other => other.into(),
        })?;
        present::subscriptions(db, std::slice::from_ref(&author), limit)
    })
    .await?;

    let response = annotated
        .pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("followed author vanished")))?;
    info!("{} subscribed to {}", user.username, response.user.username);
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let follower_id = user.id.clone();
    let removed = blocking(&state, move |db| Ok(db.unfollow(&follower_id, &author_id.to_string())?)).await?;
    if !removed {
        return Err(ApiError::bad_request("You are not subscribed to this author."));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Authors the caller follows, each with a preview of their recipes.
pub async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SubscriptionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pager = Pager::new(query.page, query.limit, state.page_size)?;
    let limit = recipes_limit(query.recipes_limit.as_deref())?;

    let (results, count) = blocking(&state, move |db| {
        let (authors, count) = db.subscriptions(&user.id, pager.size, pager.offset())?;
        Ok((present::subscriptions(db, &authors, limit)?, count))
    })
    .await?;

    Ok(Json(pager.wrap(&uri, count, results)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(password_matches("correct horse", &hash).unwrap());
        assert!(!password_matches("wrong horse", &hash).unwrap());
    }

    #[test]
    fn recipes_limit_parsing() {
        assert_eq!(recipes_limit(None).unwrap(), None);
        assert_eq!(recipes_limit(Some("3")).unwrap(), Some(3));
        assert!(matches!(recipes_limit(Some("-1")), Err(ApiError::Validation(_))));
        assert!(matches!(recipes_limit(Some("many")), Err(ApiError::Validation(_))));
    }
}
