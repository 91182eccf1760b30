use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use foodgram_db::models::UserRow;
use foodgram_types::api::Claims;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// The caller of the current request, if it presented a valid token.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<UserRow>);

impl Viewer {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

/// Extractor for handlers that need an authenticated user. Rejects with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

/// Verifies the bearer JWT, if any, and stores a [`Viewer`] in the request
/// extensions. No header means anonymous; a bad token or an unknown user is
/// rejected with 401.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let viewer = match req.headers().get(header::AUTHORIZATION) {
        None => Viewer(None),
        Some(value) => {
            let token = value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or(ApiError::Unauthorized)?;

            let claims = decode::<Claims>(
                token,
                &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                ApiError::Unauthorized
            })?
            .claims;

            let user_id = claims.sub.to_string();
            let user = blocking(&state, move |db| Ok(db.get_user(&user_id)?))
                .await?
                .ok_or_else(|| {
                    debug!("Token for unknown user {}", claims.sub);
                    ApiError::Unauthorized
                })?;
            Viewer(Some(user))
        }
    };

    req.extensions_mut().insert(viewer);
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Viewer>().cloned().unwrap_or_default())
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Viewer>() {
            Some(Viewer(Some(user))) => Ok(CurrentUser(user.clone())),
            _ => Err(ApiError::Unauthorized),
        }
    }
}
