use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use chrono::{Datelike, NaiveDate, Utc};
use tracing::info;

use foodgram_db::models::UserRow;
use foodgram_types::models::ShoppingListItem;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub const BRAND: &str = "Foodgram";

/// "First Last", or the username when both names are blank.
pub fn display_name(user: &UserRow) -> String {
    let full = format!("{} {}", user.first_name.trim(), user.last_name.trim());
    let full = full.trim();
    if full.is_empty() {
        user.username.clone()
    } else {
        full.to_string()
    }
}

pub fn render_shopping_list(owner: &str, date: NaiveDate, items: &[ShoppingListItem]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|item| format!("- {} ({}) - {}", item.name, item.measurement_unit, item.total_amount))
        .collect();

    format!(
        "Shopping list for: {owner}\n\nDate: {}\n\n{}\n\n{BRAND} ({})",
        date.format("%Y-%m-%d"),
        lines.join("\n"),
        date.year()
    )
}

/// GET /api/recipes/download_shopping_cart: the caller's aggregated cart as
/// a plain-text attachment. 400 when the cart is empty.
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user.id.clone();
    let items = blocking(&state, move |db| Ok(db.shopping_list(&user_id)?))
        .await?
        .ok_or_else(|| ApiError::bad_request("The shopping cart is empty."))?;

    info!("Shopping list for {}: {} lines", user.username, items.len());

    let body = render_shopping_list(&display_name(&user), Utc::now().date_naive(), &items);
    let disposition = format!("attachment; filename={}_shopping_list.txt", user.username);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
