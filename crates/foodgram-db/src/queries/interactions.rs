use std::collections::HashSet;

use rusqlite::Connection;

use crate::models::RecipeRow;
use crate::queries::recipes::select_recipe;
use crate::queries::{as_params, placeholders};
use crate::{Database, DbError, Result};

/// Per-user recipe collections keyed by (user, recipe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Favorites,
    ShoppingCart,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Collection::Favorites => "favorites",
            Collection::ShoppingCart => "shopping_cart",
        }
    }
}

impl Database {
    /// Adds the recipe to the user's collection and returns it.
    ///
    /// `NotFound` when the recipe does not exist, `AlreadyExists` when the
    /// primary key rejects a second entry for the same pair.
    pub fn add_to_collection(&self, collection: Collection, user_id: &str, recipe_id: i64) -> Result<RecipeRow> {
        self.with_conn(|conn| {
            let recipe = select_recipe(conn, recipe_id)?.ok_or(DbError::NotFound)?;
            insert_entry(conn, collection, user_id, recipe_id)?;
            Ok(recipe)
        })
    }

    /// `NotFound` when the recipe does not exist. Returns false when the
    /// recipe exists but was not in the collection.
    pub fn remove_from_collection(&self, collection: Collection, user_id: &str, recipe_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            select_recipe(conn, recipe_id)?.ok_or(DbError::NotFound)?;
            delete_entry(conn, collection, user_id, recipe_id)
        })
    }

    /// Which of `recipe_ids` are in the user's collection.
    pub fn collection_members(
        &self,
        collection: Collection,
        user_id: &str,
        recipe_ids: &[i64],
    ) -> Result<HashSet<i64>> {
        self.with_conn(|conn| select_members(conn, collection, user_id, recipe_ids))
    }
}

/// No read-before-write: the (user_id, recipe_id) primary key decides
/// whether the entry already exists.
pub fn insert_entry(conn: &Connection, collection: Collection, user_id: &str, recipe_id: i64) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO {} (user_id, recipe_id) VALUES (?1, ?2)", collection.table()),
        (user_id, recipe_id),
    )?;
    Ok(())
}

/// Returns false when there was nothing to delete.
pub fn delete_entry(conn: &Connection, collection: Collection, user_id: &str, recipe_id: i64) -> Result<bool> {
    let changed = conn.execute(
        &format!("DELETE FROM {} WHERE user_id = ?1 AND recipe_id = ?2", collection.table()),
        (user_id, recipe_id),
    )?;
    Ok(changed > 0)
}

pub fn select_members(
    conn: &Connection,
    collection: Collection,
    user_id: &str,
    recipe_ids: &[i64],
) -> Result<HashSet<i64>> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let sql = format!(
        "SELECT recipe_id FROM {} WHERE user_id = ? AND recipe_id IN ({})",
        collection.table(),
        placeholders(recipe_ids.len())
    );
    let mut params = as_params(recipe_ids);
    params.insert(0, &user_id);

    let mut stmt = conn.prepare(&sql)?;
    let found = stmt
        .query_map(params.as_slice(), |row| row.get(0))?
        .collect::<std::result::Result<HashSet<i64>, _>>()?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::recipes::tests::{draft, seeded};

    #[test]
    fn second_add_is_rejected_by_the_constraint() {
        let db = seeded();
        let id = db.create_recipe("u1", &draft("soup", vec![2], vec![(1, 5)])).unwrap();

        let recipe = db.add_to_collection(Collection::Favorites, "u2", id).unwrap();
        assert_eq!(recipe.name, "soup");

        let err = db.add_to_collection(Collection::Favorites, "u2", id).unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));
    }

    #[test]
    fn raw_duplicate_insert_is_rejected() {
        let db = seeded();
        let id = db.create_recipe("u1", &draft("soup", vec![2], vec![(1, 5)])).unwrap();

        db.with_conn(|conn| {
            insert_entry(conn, Collection::ShoppingCart, "u2", id)?;
            let err = insert_entry(conn, Collection::ShoppingCart, "u2", id).unwrap_err();
            assert!(matches!(err, DbError::AlreadyExists(_)));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn second_remove_fails() {
        let db = seeded();
        let id = db.create_recipe("u1", &draft("soup", vec![2], vec![(1, 5)])).unwrap();

        db.add_to_collection(Collection::ShoppingCart, "u2", id).unwrap();
        assert!(db.remove_from_collection(Collection::ShoppingCart, "u2", id).unwrap());
        assert!(!db.remove_from_collection(Collection::ShoppingCart, "u2", id).unwrap());
    }

    #[test]
    fn unknown_recipe_is_not_found() {
        let db = seeded();
        assert!(matches!(
            db.add_to_collection(Collection::Favorites, "u1", 77),
            Err(DbError::NotFound)
        ));
        assert!(matches!(
            db.remove_from_collection(Collection::Favorites, "u1", 77),
            Err(DbError::NotFound)
        ));
    }

    #[test]
    fn collections_are_independent() {
        let db = seeded();
        let a = db.create_recipe("u1", &draft("a", vec![1], vec![(1, 1)])).unwrap();
        let b = db.create_recipe("u1", &draft("b", vec![1], vec![(1, 1)])).unwrap();

        db.add_to_collection(Collection::Favorites, "u2", a).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", b).unwrap();

        assert_eq!(
            db.collection_members(Collection::Favorites, "u2", &[a, b]).unwrap(),
            HashSet::from([a])
        );
        assert_eq!(
            db.collection_members(Collection::ShoppingCart, "u2", &[a, b]).unwrap(),
            HashSet::from([b])
        );
        assert!(db.collection_members(Collection::Favorites, "u1", &[a, b]).unwrap().is_empty());
    }

    #[test]
    fn membership_filters_use_the_viewer() {
        use crate::RecipeFilter;

        let db = seeded();
        let a = db.create_recipe("u1", &draft("a", vec![1], vec![(1, 1)])).unwrap();
        let b = db.create_recipe("u1", &draft("b", vec![1], vec![(1, 1)])).unwrap();
        db.add_to_collection(Collection::Favorites, "u2", a).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", a).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", b).unwrap();

        let favorited = RecipeFilter {
            is_favorited: true,
            ..Default::default()
        };
        let (rows, total) = db.list_recipes(&favorited, Some("u2"), 10, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, a);

        // Anonymous callers get the unfiltered list.
        let (_, total) = db.list_recipes(&favorited, None, 10, 0).unwrap();
        assert_eq!(total, 2);

        let both = RecipeFilter {
            is_favorited: true,
            is_in_shopping_cart: true,
            ..Default::default()
        };
        let (_, total) = db.list_recipes(&both, Some("u2"), 10, 0).unwrap();
        assert_eq!(total, 1);

        let in_cart = RecipeFilter {
            is_in_shopping_cart: true,
            ..Default::default()
        };
        let (_, total) = db.list_recipes(&in_cart, Some("u1"), 10, 0).unwrap();
        assert_eq!(total, 0);
    }
}
