use std::sync::Arc;

use tracing::error;

use foodgram_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Page size when the client does not pass `limit`.
    pub page_size: u32,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>, page_size: u32) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
            page_size,
        })
    }
}

/// Runs blocking DB work off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {e}"))
        })?
}
