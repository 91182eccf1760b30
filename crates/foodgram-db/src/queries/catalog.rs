use std::collections::HashSet;

use rusqlite::{Connection, Row};

use crate::models::{IngredientRow, TagRow};
use crate::queries::{OptionalExt, as_params, placeholders};
use crate::{Database, Result};

impl Database {
    // -- Tags --

    /// Inserts a tag unless one with the same name or slug exists.
    /// Returns whether a row was written.
    pub fn add_tag(&self, name: &str, slug: &str, color: &str) -> Result<bool> {
        self.with_conn(|conn| insert_tag(conn, name, slug, color))
    }

    pub fn list_tags(&self) -> Result<Vec<TagRow>> {
        self.with_conn(select_tags)
    }

    pub fn get_tag(&self, id: i64) -> Result<Option<TagRow>> {
        self.with_conn(|conn| select_tag(conn, id))
    }

    // -- Ingredients --

    pub fn add_ingredient(&self, name: &str, measurement_unit: &str) -> Result<bool> {
        self.with_conn(|conn| insert_ingredient(conn, name, measurement_unit))
    }

    /// Ingredients ordered by name. `name_prefix` is a case-sensitive
    /// starts-with match.
    pub fn list_ingredients(&self, name_prefix: Option<&str>) -> Result<Vec<IngredientRow>> {
        self.with_conn(|conn| select_ingredients(conn, name_prefix))
    }

    pub fn get_ingredient(&self, id: i64) -> Result<Option<IngredientRow>> {
        self.with_conn(|conn| select_ingredient(conn, id))
    }
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<TagRow> {
    Ok(TagRow {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        slug: row.get(3)?,
    })
}

fn ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<IngredientRow> {
    Ok(IngredientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        measurement_unit: row.get(2)?,
    })
}

pub fn insert_tag(conn: &Connection, name: &str, slug: &str, color: &str) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO tags (name, slug, color) VALUES (?1, ?2, ?3)",
        (name, slug, color),
    )?;
    Ok(changed > 0)
}

pub fn select_tags(conn: &Connection) -> Result<Vec<TagRow>> {
    let mut stmt = conn.prepare("SELECT id, name, color, slug FROM tags ORDER BY name")?;
    let rows = stmt
        .query_map([], tag_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn select_tag(conn: &Connection, id: i64) -> Result<Option<TagRow>> {
    conn.query_row("SELECT id, name, color, slug FROM tags WHERE id = ?1", [id], tag_from_row)
        .optional()
}

/// Tags of each recipe in `recipe_ids`, as (recipe id, tag) pairs.
pub fn select_tags_for_recipes(conn: &Connection, recipe_ids: &[i64]) -> Result<Vec<(i64, TagRow)>> {
    if recipe_ids.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!(
        "SELECT t.id, t.name, t.color, t.slug, rt.recipe_id
         FROM recipe_tags rt
         JOIN tags t ON t.id = rt.tag_id
         WHERE rt.recipe_id IN ({})
         ORDER BY t.name",
        placeholders(recipe_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(as_params(recipe_ids).as_slice(), |row| Ok((row.get(4)?, tag_from_row(row)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Subset of `ids` that exist in the tag catalog.
pub fn existing_tag_ids(conn: &Connection, ids: &[i64]) -> Result<HashSet<i64>> {
    existing_ids(conn, "tags", ids)
}

pub fn insert_ingredient(conn: &Connection, name: &str, measurement_unit: &str) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO ingredients (name, measurement_unit) VALUES (?1, ?2)",
        (name, measurement_unit),
    )?;
    Ok(changed > 0)
}

pub fn select_ingredients(conn: &Connection, name_prefix: Option<&str>) -> Result<Vec<IngredientRow>> {
    // substr() keeps the match case-sensitive, unlike LIKE.
    let mut stmt = conn.prepare(
        "SELECT id, name, measurement_unit FROM ingredients
         WHERE ?1 IS NULL OR substr(name, 1, length(?1)) = ?1
         ORDER BY name, measurement_unit",
    )?;
    let rows = stmt
        .query_map([name_prefix], ingredient_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn select_ingredient(conn: &Connection, id: i64) -> Result<Option<IngredientRow>> {
    conn.query_row(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?1",
        [id],
        ingredient_from_row,
    )
    .optional()
}

pub fn existing_ingredient_ids(conn: &Connection, ids: &[i64]) -> Result<HashSet<i64>> {
    existing_ids(conn, "ingredients", ids)
}

fn existing_ids(conn: &Connection, table: &str, ids: &[i64]) -> Result<HashSet<i64>> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    let sql = format!("SELECT id FROM {table} WHERE id IN ({})", placeholders(ids.len()));
    let mut stmt = conn.prepare(&sql)?;
    let found = stmt
        .query_map(as_params(ids).as_slice(), |row| row.get(0))?
        .collect::<std::result::Result<HashSet<i64>, _>>()?;
    Ok(found)
}
