//! `Path` and `Query` extractors whose rejections go through [`ApiError`],
//! so malformed ids and query strings answer with the usual JSON bodies.

use axum::extract::rejection::PathRejection;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// Path parameters. A value that does not parse names no resource, so it
/// is a 404.
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                debug!("Unparsable path {}: {}", parts.uri.path(), e.body_text());
                Err(ApiError::NotFound)
            }
            Err(other) => Err(ApiError::Internal(anyhow::anyhow!("path extraction failed: {}", other.body_text()))),
        }
    }
}

/// Query string, with repeated keys collected into `Vec` fields. A value
/// that does not deserialize is a 400 field error under `query`.
#[derive(Debug, Clone, Default)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum_extra::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map(|axum_extra::extract::Query(value)| Query(value))
            .map_err(|rejection| ApiError::field("query", rejection.to_string()))
    }
}
