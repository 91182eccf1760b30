use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, Row, params_from_iter};

use crate::filter::RecipeFilter;
use crate::models::{RecipeDraft, RecipeIngredientRow, RecipeRow, TagRow};
use crate::queries::catalog::{existing_ingredient_ids, existing_tag_ids, select_tags_for_recipes};
use crate::queries::{OptionalExt, as_params, placeholders};
use crate::{Database, DbError, Result};

const RECIPE_COLUMNS: &str = "r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, r.pub_date";

impl Database {
    /// Writes the recipe, its tag links and ingredient lines in one transaction.
    pub fn create_recipe(&self, author_id: &str, draft: &RecipeDraft) -> Result<i64> {
        self.with_tx(|conn| insert_recipe(conn, author_id, draft))
    }

    /// Replaces the recipe's fields, tags and every ingredient line.
    pub fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<()> {
        self.with_tx(|conn| update_recipe(conn, id, draft))
    }

    pub fn delete_recipe(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| delete_recipe(conn, id))
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<RecipeRow>> {
        self.with_conn(|conn| select_recipe(conn, id))
    }

    /// One page of filtered recipes, newest first, plus the filtered total.
    pub fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<RecipeRow>, i64)> {
        self.with_conn(|conn| {
            let rows = select_recipes(conn, filter, viewer, limit, offset)?;
            let total = count_recipes(conn, filter, viewer)?;
            Ok((rows, total))
        })
    }

    pub fn recipe_ingredients(&self, recipe_ids: &[i64]) -> Result<Vec<RecipeIngredientRow>> {
        self.with_conn(|conn| select_ingredients_for_recipes(conn, recipe_ids))
    }

    pub fn recipe_tags(&self, recipe_ids: &[i64]) -> Result<Vec<(i64, TagRow)>> {
        self.with_conn(|conn| select_tags_for_recipes(conn, recipe_ids))
    }

    /// Ids from the draft that are missing from the catalog, as
    /// (unknown tag ids, unknown ingredient ids).
    pub fn unknown_catalog_ids(&self, draft: &RecipeDraft) -> Result<(Vec<i64>, Vec<i64>)> {
        self.with_conn(|conn| {
            let tags = existing_tag_ids(conn, &draft.tag_ids)?;
            let ingredient_ids: Vec<i64> = draft.ingredients.iter().map(|(id, _)| *id).collect();
            let ingredients = existing_ingredient_ids(conn, &ingredient_ids)?;
            Ok((
                missing(&draft.tag_ids, &tags),
                missing(&ingredient_ids, &ingredients),
            ))
        })
    }
}

fn missing(wanted: &[i64], found: &HashSet<i64>) -> Vec<i64> {
    wanted.iter().copied().filter(|id| !found.contains(id)).collect()
}

pub(crate) fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<RecipeRow> {
    Ok(RecipeRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        name: row.get(2)?,
        image: row.get(3)?,
        text: row.get(4)?,
        cooking_time: row.get(5)?,
        pub_date: row.get(6)?,
    })
}

pub fn insert_recipe(conn: &Connection, author_id: &str, draft: &RecipeDraft) -> Result<i64> {
    conn.execute(
        "INSERT INTO recipes (author_id, name, image, text, cooking_time) VALUES (?1, ?2, ?3, ?4, ?5)",
        (author_id, &draft.name, &draft.image, &draft.text, draft.cooking_time),
    )?;
    let id = conn.last_insert_rowid();
    insert_links(conn, id, draft)?;
    Ok(id)
}

pub fn update_recipe(conn: &Connection, id: i64, draft: &RecipeDraft) -> Result<()> {
    let changed = conn.execute(
        "UPDATE recipes SET name = ?1, image = ?2, text = ?3, cooking_time = ?4 WHERE id = ?5",
        (&draft.name, &draft.image, &draft.text, draft.cooking_time, id),
    )?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }

    conn.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", [id])?;
    conn.execute("DELETE FROM recipe_tags WHERE recipe_id = ?1", [id])?;
    insert_links(conn, id, draft)
}

fn insert_links(conn: &Connection, recipe_id: i64, draft: &RecipeDraft) -> Result<()> {
    let mut tag_stmt = conn.prepare_cached("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?1, ?2)")?;
    for tag_id in &draft.tag_ids {
        tag_stmt.execute((recipe_id, tag_id))?;
    }

    let mut line_stmt = conn.prepare_cached(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?1, ?2, ?3)",
    )?;
    for (ingredient_id, amount) in &draft.ingredients {
        line_stmt.execute((recipe_id, ingredient_id, amount))?;
    }
    Ok(())
}

pub fn delete_recipe(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

pub fn select_recipe(conn: &Connection, id: i64) -> Result<Option<RecipeRow>> {
    conn.query_row(
        &format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = ?1"),
        [id],
        recipe_from_row,
    )
    .optional()
}

pub fn select_recipes(
    conn: &Connection,
    filter: &RecipeFilter,
    viewer: Option<&str>,
    limit: u32,
    offset: u32,
) -> Result<Vec<RecipeRow>> {
    let mut sql = filter.to_sql(viewer);
    sql.params.push(limit.into());
    sql.params.push(offset.into());

    let mut stmt = conn.prepare(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r {}
         ORDER BY r.pub_date DESC, r.id DESC
         LIMIT ? OFFSET ?",
        sql.clause
    ))?;
    let rows = stmt
        .query_map(params_from_iter(sql.params), recipe_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_recipes(conn: &Connection, filter: &RecipeFilter, viewer: Option<&str>) -> Result<i64> {
    let sql = filter.to_sql(viewer);
    Ok(conn.query_row(
        &format!("SELECT COUNT(*) FROM recipes r {}", sql.clause),
        params_from_iter(sql.params),
        |r| r.get(0),
    )?)
}

pub fn select_ingredients_for_recipes(
    conn: &Connection,
    recipe_ids: &[i64],
) -> Result<Vec<RecipeIngredientRow>> {
    if recipe_ids.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!(
        "SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
         FROM recipe_ingredients ri
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id IN ({})
         ORDER BY i.name",
        placeholders(recipe_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(as_params(recipe_ids).as_slice(), |row| {
            Ok(RecipeIngredientRow {
                recipe_id: row.get(0)?,
                ingredient_id: row.get(1)?,
                name: row.get(2)?,
                measurement_unit: row.get(3)?,
                amount: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recent recipes of an author; `limit = None` returns all of them.
pub fn select_recent_by_author(
    conn: &Connection,
    author_id: &str,
    limit: Option<u32>,
) -> Result<Vec<RecipeRow>> {
    // LIMIT -1 means no limit in SQLite.
    let limit = limit.map(i64::from).unwrap_or(-1);
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r
         WHERE r.author_id = ?1
         ORDER BY r.pub_date DESC, r.id DESC
         LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map((author_id, limit), recipe_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_by_authors(conn: &Connection, author_ids: &[String]) -> Result<HashMap<String, i64>> {
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT author_id, COUNT(*) FROM recipes WHERE author_id IN ({}) GROUP BY author_id",
        placeholders(author_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let counts = stmt
        .query_map(as_params(author_ids).as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<HashMap<String, i64>, _>>()?;
    Ok(counts)
}
