use std::collections::HashSet;

use foodgram_db::models::RecipeDraft;
use foodgram_types::api::{RecipeWriteRequest, RegisterRequest};

use crate::error::{ApiError, FieldErrors};

pub const RECIPE_NAME_MAX: usize = 200;
pub const USERNAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 254;
pub const PASSWORD_MIN: usize = 8;
/// Per-line amount ceiling. The database column carries the same CHECK.
pub const AMOUNT_MAX: i64 = i32::MAX as i64;

#[derive(Default)]
struct Collector(FieldErrors);

impl Collector {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

/// Shape checks for a recipe body. Catalog existence is checked separately
/// against the database.
pub fn recipe_draft(req: RecipeWriteRequest) -> Result<RecipeDraft, ApiError> {
    let mut errors = Collector::default();

    if req.ingredients.is_empty() {
        errors.add("ingredients", "A recipe needs at least one ingredient.");
    }
    let mut seen = HashSet::new();
    for line in &req.ingredients {
        if !seen.insert(line.id) {
            errors.add("ingredients", format!("Ingredient {} is listed more than once.", line.id));
        }
        if line.amount < 1 {
            errors.add("ingredients", format!("Amount of ingredient {} must be at least 1.", line.id));
        } else if line.amount > AMOUNT_MAX {
            errors.add(
                "ingredients",
                format!("Amount of ingredient {} must be at most {AMOUNT_MAX}.", line.id),
            );
        }
    }

    if req.tags.is_empty() {
        errors.add("tags", "A recipe needs at least one tag.");
    }
    let mut seen = HashSet::new();
    for tag in &req.tags {
        if !seen.insert(*tag) {
            errors.add("tags", format!("Tag {tag} is listed more than once."));
        }
    }

    if req.cooking_time < 1 {
        errors.add("cooking_time", "Cooking time must be at least one minute.");
    }
    if req.name.trim().is_empty() {
        errors.add("name", "This field may not be blank.");
    } else if req.name.chars().count() > RECIPE_NAME_MAX {
        errors.add("name", format!("Ensure this field has no more than {RECIPE_NAME_MAX} characters."));
    }
    if req.text.trim().is_empty() {
        errors.add("text", "This field may not be blank.");
    }
    if req.image.trim().is_empty() {
        errors.add("image", "This field may not be blank.");
    }

    errors.finish(RecipeDraft {
        name: req.name,
        image: req.image,
        text: req.text,
        cooking_time: req.cooking_time,
        tag_ids: req.tags,
        ingredients: req.ingredients.into_iter().map(|l| (l.id, l.amount)).collect(),
    })
}

/// Turns ids missing from the catalog into field errors.
pub fn unknown_catalog_ids(unknown_tags: &[i64], unknown_ingredients: &[i64]) -> Result<(), ApiError> {
    let mut errors = Collector::default();
    for id in unknown_tags {
        errors.add("tags", format!("Tag {id} does not exist."));
    }
    for id in unknown_ingredients {
        errors.add("ingredients", format!("Ingredient {id} does not exist."));
    }
    errors.finish(())
}

pub fn registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = Collector::default();

    if req.email.trim().is_empty() {
        errors.add("email", "This field may not be blank.");
    } else if !req.email.contains('@') || req.email.len() > EMAIL_MAX {
        errors.add("email", "Enter a valid email address.");
    }

    if req.username.is_empty() {
        errors.add("username", "This field may not be blank.");
    } else if req.username.chars().count() > USERNAME_MAX {
        errors.add("username", format!("Ensure this field has no more than {USERNAME_MAX} characters."));
    } else if !req.username.chars().all(is_username_char) {
        errors.add("username", "Letters, digits and @/./+/-/_ only.");
    }

    if req.first_name.trim().is_empty() {
        errors.add("first_name", "This field may not be blank.");
    }
    if req.last_name.trim().is_empty() {
        errors.add("last_name", "This field may not be blank.");
    }

    if let Err(message) = password_strength(&req.password) {
        errors.add("password", message);
    }

    errors.finish(())
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_')
}

pub fn password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(format!("Password must contain at least {PASSWORD_MIN} characters."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodgram_types::api::IngredientAmount;

    fn request() -> RecipeWriteRequest {
        RecipeWriteRequest {
            ingredients: vec![IngredientAmount { id: 1, amount: 10 }],
            tags: vec![1],
            image: "recipes/soup.png".into(),
            name: "Soup".into(),
            text: "Boil.".into(),
            cooking_time: 30,
        }
    }

    fn fields(err: ApiError) -> FieldErrors {
        match err {
            ApiError::Validation(fields) => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_recipe_becomes_a_draft() {
        let draft = recipe_draft(request()).unwrap();
        assert_eq!(draft.ingredients, vec![(1, 10)]);
        assert_eq!(draft.tag_ids, vec![1]);
    }

    #[test]
    fn empty_and_duplicate_lines() {
        let mut req = request();
        req.ingredients.clear();
        req.tags = vec![2, 2];
        let errors = fields(recipe_draft(req).unwrap_err());
        assert_eq!(errors["ingredients"].len(), 1);
        assert_eq!(errors["tags"], vec!["Tag 2 is listed more than once."]);

        let mut req = request();
        req.ingredients.push(IngredientAmount { id: 1, amount: 0 });
        let errors = fields(recipe_draft(req).unwrap_err());
        assert_eq!(errors["ingredients"].len(), 2);
    }

    #[test]
    fn amounts_are_capped() {
        let mut req = request();
        req.ingredients = vec![IngredientAmount { id: 1, amount: AMOUNT_MAX }];
        assert_eq!(recipe_draft(req).unwrap().ingredients, vec![(1, AMOUNT_MAX)]);

        let mut req = request();
        req.ingredients = vec![IngredientAmount { id: 1, amount: AMOUNT_MAX + 1 }];
        let errors = fields(recipe_draft(req).unwrap_err());
        assert_eq!(errors["ingredients"], vec![format!("Amount of ingredient 1 must be at most {AMOUNT_MAX}.")]);

        let mut req = request();
        req.ingredients = vec![IngredientAmount { id: 1, amount: i64::MAX }];
        assert!(recipe_draft(req).is_err());
    }

    #[test]
    fn scalar_fields() {
        let mut req = request();
        req.cooking_time = 0;
        req.name = "x".repeat(RECIPE_NAME_MAX + 1);
        req.text = "  ".into();
        let errors = fields(recipe_draft(req).unwrap_err());
        assert!(errors.contains_key("cooking_time"));
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("text"));
        assert!(!errors.contains_key("image"));
    }

    #[test]
    fn registration_rules() {
        let mut req = RegisterRequest {
            email: "cook@example.com".into(),
            username: "cook.42".into(),
            first_name: "Ann".into(),
            last_name: "Cook".into(),
            password: "long-enough".into(),
        };
        registration(&req).unwrap();

        req.email = "nope".into();
        req.username = "has space".into();
        req.password = "short".into();
        let errors = fields(registration(&req).unwrap_err());
        assert_eq!(
            errors.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["email", "password", "username"]
        );
    }

    #[test]
    fn unknown_ids_map_to_fields() {
        unknown_catalog_ids(&[], &[]).unwrap();
        let errors = fields(unknown_catalog_ids(&[9], &[]).unwrap_err());
        assert_eq!(errors["tags"], vec!["Tag 9 does not exist."]);
    }
}
