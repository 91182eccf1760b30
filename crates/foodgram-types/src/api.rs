use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Tag;

// -- JWT Claims --

/// JWT claims issued by the external auth service. This server only verifies
/// them; `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// An author the caller follows, with a preview of their latest recipes.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

// -- Recipes --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

/// Body of both create and update. Update replaces every ingredient line and
/// tag link of the recipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeWriteRequest {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i64>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

// -- Pagination --

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

// -- Fixtures --

/// Catalog seed file loaded at startup.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFixtures {
    #[serde(default)]
    pub ingredients: Vec<IngredientFixture>,
    #[serde(default)]
    pub tags: Vec<TagFixture>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientFixture {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Deserialize)]
pub struct TagFixture {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn subscription_flattens_the_author() {
        let response = SubscriptionResponse {
            user: UserResponse {
                email: "bob@example.com".into(),
                id: Uuid::nil(),
                username: "bob".into(),
                first_name: "Bob".into(),
                last_name: "Baker".into(),
                is_subscribed: true,
            },
            recipes: vec![],
            recipes_count: 4,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["username"], "bob");
        assert_eq!(value["is_subscribed"], true);
        assert_eq!(value["recipes_count"], 4);
        assert!(value.get("user").is_none());
    }

    #[test]
    fn recipe_body_rejects_unknown_fields() {
        let body = json!({
            "ingredients": [{"id": 1, "amount": 2}],
            "tags": [1],
            "image": "a.png",
            "name": "Soup",
            "text": "Boil.",
            "cooking_time": 5,
        });
        let req: RecipeWriteRequest = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(req.ingredients[0].amount, 2);

        let mut extra = body;
        extra["author"] = json!(1);
        assert!(serde_json::from_value::<RecipeWriteRequest>(extra).is_err());
    }
}
