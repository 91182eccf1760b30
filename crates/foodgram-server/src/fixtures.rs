use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use foodgram_db::Database;
use foodgram_types::api::CatalogFixtures;
use foodgram_types::models::Tag;

/// Loads tags and ingredients from a JSON file. Rows already present are
/// skipped, so the import can run on every start. Returns the number of
/// (tags, ingredients) written.
pub fn load(db: &Database, path: &Path) -> anyhow::Result<(usize, usize)> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading fixtures {}", path.display()))?;
    let fixtures: CatalogFixtures =
        serde_json::from_str(&raw).with_context(|| format!("parsing fixtures {}", path.display()))?;
    import(db, &fixtures)
}

pub fn import(db: &Database, fixtures: &CatalogFixtures) -> anyhow::Result<(usize, usize)> {
    let mut tags = 0;
    for tag in &fixtures.tags {
        if !Tag::is_valid_color(&tag.color) {
            warn!("Skipping tag '{}': bad color '{}'", tag.slug, tag.color);
            continue;
        }
        if db.add_tag(&tag.name, &tag.slug, &tag.color)? {
            tags += 1;
        }
    }

    let mut ingredients = 0;
    for ingredient in &fixtures.ingredients {
        if db.add_ingredient(&ingredient.name, &ingredient.measurement_unit)? {
            ingredients += 1;
        }
    }

    info!(
        "Fixtures: {} new tags, {} new ingredients ({} + {} in file)",
        tags,
        ingredients,
        fixtures.tags.len(),
        fixtures.ingredients.len()
    );
    Ok((tags, ingredients))
}
