use rusqlite::Connection;

use foodgram_types::models::ShoppingListItem;

use crate::{Database, Result};

impl Database {
    /// Sums every ingredient line of the recipes in the user's cart.
    ///
    /// Returns `None` when the cart is empty. Lines are grouped by ingredient
    /// name and measurement unit (not by ingredient id) and ordered by name,
    /// then unit.
    pub fn shopping_list(&self, user_id: &str) -> Result<Option<Vec<ShoppingListItem>>> {
        self.with_conn(|conn| {
            if !cart_has_entries(conn, user_id)? {
                return Ok(None);
            }
            Ok(Some(aggregate_cart(conn, user_id)?))
        })
    }
}

pub fn cart_has_entries(conn: &Connection, user_id: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM shopping_cart WHERE user_id = ?1)",
        [user_id],
        |r| r.get(0),
    )?)
}

pub fn aggregate_cart(conn: &Connection, user_id: &str) -> Result<Vec<ShoppingListItem>> {
    let mut stmt = conn.prepare(
        "SELECT i.name, i.measurement_unit, SUM(ri.amount)
         FROM shopping_cart c
         JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE c.user_id = ?1
         GROUP BY i.name, i.measurement_unit
         ORDER BY i.name, i.measurement_unit",
    )?;
    let items = stmt
        .query_map([user_id], |row| {
            Ok(ShoppingListItem {
                name: row.get(0)?,
                measurement_unit: row.get(1)?,
                total_amount: row.get::<_, i64>(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use crate::queries::interactions::Collection;
    use crate::queries::recipes::tests::{draft, seeded};

    fn item(name: &str, unit: &str, total: i64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.into(),
            measurement_unit: unit.into(),
            total_amount: total,
        }
    }

    #[test]
    fn empty_cart_has_nothing_to_report() {
        let db = seeded();
        db.create_recipe("u1", &draft("soup", vec![2], vec![(1, 5)])).unwrap();
        assert_eq!(db.shopping_list("u2").unwrap(), None);
    }

    #[test]
    fn same_ingredient_is_summed_across_recipes() {
        let db = seeded();
        let r1 = db.create_recipe("u1", &draft("r1", vec![1], vec![(1, 5)])).unwrap();
        let r2 = db.create_recipe("u1", &draft("r2", vec![2], vec![(1, 3), (3, 250)])).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", r1).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", r2).unwrap();

        let list = db.shopping_list("u2").unwrap().unwrap();
        assert_eq!(list, vec![item("Milk", "ml", 250), item("Salt", "g", 8)]);
    }

    #[test]
    fn grouping_is_by_name_and_unit() {
        let db = seeded();
        // Same name, different unit: a separate catalog row and a separate line.
        db.add_ingredient("Salt", "pinch").unwrap();
        let pinch = db
            .list_ingredients(Some("Salt"))
            .unwrap()
            .into_iter()
            .find(|i| i.measurement_unit == "pinch")
            .unwrap()
            .id;

        let r1 = db.create_recipe("u1", &draft("r1", vec![1], vec![(1, 5), (pinch, 2)])).unwrap();
        let r2 = db.create_recipe("u1", &draft("r2", vec![1], vec![(pinch, 1)])).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", r1).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", r2).unwrap();

        let list = db.shopping_list("u2").unwrap().unwrap();
        assert_eq!(list, vec![item("Salt", "g", 5), item("Salt", "pinch", 3)]);
    }

    #[test]
    fn other_users_carts_are_ignored() {
        let db = seeded();
        let r1 = db.create_recipe("u1", &draft("r1", vec![1], vec![(2, 4)])).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u1", r1).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", r1).unwrap();

        assert_eq!(db.shopping_list("u1").unwrap().unwrap(), vec![item("Sugar", "g", 4)]);
    }

    #[test]
    fn largest_lines_sum_past_32_bits() {
        let db = seeded();
        let big = i64::from(i32::MAX);
        let r1 = db.create_recipe("u1", &draft("r1", vec![1], vec![(1, big)])).unwrap();
        let r2 = db.create_recipe("u1", &draft("r2", vec![1], vec![(1, big)])).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", r1).unwrap();
        db.add_to_collection(Collection::ShoppingCart, "u2", r2).unwrap();

        assert_eq!(db.shopping_list("u2").unwrap().unwrap(), vec![item("Salt", "g", 4_294_967_294)]);
    }

    #[test]
    fn oversized_line_is_refused_by_the_schema() {
        let db = seeded();
        let err = db
            .create_recipe("u1", &draft("huge", vec![1], vec![(1, i64::from(i32::MAX) + 1)]))
            .unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
        assert!(db.list_recipes(&Default::default(), None, 10, 0).unwrap().0.is_empty());
    }
}
