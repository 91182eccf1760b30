use rusqlite::types::Value;
use uuid::Uuid;

use crate::queries::placeholders;

/// Recipe list filter. Fields combine with AND; values inside `tags` and
/// `authors` combine with OR.
///
/// `is_favorited` and `is_in_shopping_cart` only restrict the list when a
/// viewer is known. For an anonymous caller they are ignored and the list
/// stays unfiltered on that field.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Tag slugs.
    pub tags: Vec<String>,
    pub authors: Vec<Uuid>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// A `WHERE` clause over the `recipes r` alias with positional `?` params.
pub(crate) struct SqlFilter {
    pub clause: String,
    pub params: Vec<Value>,
}

impl RecipeFilter {
    pub(crate) fn to_sql(&self, viewer: Option<&str>) -> SqlFilter {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if !self.tags.is_empty() {
            let marks = push_all(&mut params, self.tags.iter().cloned());
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
                         WHERE rt.recipe_id = r.id AND t.slug IN ({marks}))"
            ));
        }

        if !self.authors.is_empty() {
            let marks = push_all(&mut params, self.authors.iter().map(Uuid::to_string));
            conditions.push(format!("r.author_id IN ({marks})"));
        }

        if let Some(viewer) = viewer {
            if self.is_favorited {
                params.push(Value::Text(viewer.to_string()));
                conditions.push(
                    "EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ?)".into(),
                );
            }
            if self.is_in_shopping_cart {
                params.push(Value::Text(viewer.to_string()));
                conditions.push(
                    "EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ?)".into(),
                );
            }
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        SqlFilter { clause, params }
    }
}

/// Appends `values` as text params and returns their `IN (...)` marks.
fn push_all(params: &mut Vec<Value>, values: impl Iterator<Item = String>) -> String {
    let start = params.len();
    params.extend(values.map(Value::Text));
    placeholders(params.len() - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_clause() {
        let sql = RecipeFilter::default().to_sql(Some("u1"));
        assert!(sql.clause.is_empty());
        assert!(sql.params.is_empty());
    }

    #[test]
    fn membership_flags_need_a_viewer() {
        let filter = RecipeFilter {
            is_favorited: true,
            is_in_shopping_cart: true,
            ..Default::default()
        };
        assert!(filter.to_sql(None).clause.is_empty());

        let sql = filter.to_sql(Some("u1"));
        assert!(sql.clause.contains("favorites"));
        assert!(sql.clause.contains("shopping_cart"));
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn params_follow_clause_order() {
        let author = Uuid::new_v4();
        let filter = RecipeFilter {
            tags: vec!["breakfast".into(), "lunch".into()],
            authors: vec![author],
            ..Default::default()
        };
        let sql = filter.to_sql(None);
        assert_eq!(
            sql.params,
            vec![
                Value::Text("breakfast".into()),
                Value::Text("lunch".into()),
                Value::Text(author.to_string()),
            ]
        );
        assert!(sql.clause.contains("IN (?, ?)"));
        assert!(sql.clause.contains(" AND "));
    }
}
