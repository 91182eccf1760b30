pub mod catalog;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod pagination;
pub mod present;
pub mod recipes;
pub mod shopping;
pub mod state;
pub mod users;
pub mod validation;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::state::AppState;

/// Every `/api` route. Authentication runs on all of them; handlers that
/// need a user take [`middleware::CurrentUser`].
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users", get(users::list_users).post(users::register))
        .route("/users/me", get(users::me))
        .route("/users/set_password", post(users::set_password))
        .route("/users/subscriptions", get(users::subscriptions))
        .route("/users/{id}", get(users::get_user))
        .route(
            "/users/{id}/subscribe",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/tags", get(catalog::list_tags))
        .route("/tags/{id}", get(catalog::get_tag))
        .route("/ingredients", get(catalog::list_ingredients))
        .route("/ingredients/{id}", get(catalog::get_ingredient))
        .route("/recipes", get(recipes::list_recipes).post(recipes::create_recipe))
        .route("/recipes/download_shopping_cart", get(shopping::download_shopping_cart))
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .layer(from_fn_with_state(state.clone(), middleware::authenticate));

    Router::new().nest("/api", api).with_state(state)
}
