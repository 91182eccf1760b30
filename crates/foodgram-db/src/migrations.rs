use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE,
                username    TEXT NOT NULL UNIQUE,
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE tags (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL UNIQUE,
                slug    TEXT NOT NULL UNIQUE,
                color   TEXT NOT NULL
            );

            CREATE TABLE ingredients (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT NOT NULL CHECK (name <> ''),
                measurement_unit    TEXT NOT NULL CHECK (measurement_unit <> ''),
                UNIQUE (name, measurement_unit)
            );

            CREATE TABLE recipes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name            TEXT NOT NULL,
                image           TEXT NOT NULL,
                text            TEXT NOT NULL,
                cooking_time    INTEGER NOT NULL CHECK (cooking_time >= 1),
                pub_date        TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
            );

            CREATE INDEX idx_recipes_pub_date ON recipes(pub_date DESC, id DESC);
            CREATE INDEX idx_recipes_author ON recipes(author_id);

            CREATE TABLE recipe_tags (
                recipe_id   INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                tag_id      INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (recipe_id, tag_id)
            );

            CREATE TABLE recipe_ingredients (
                recipe_id       INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                ingredient_id   INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                amount          INTEGER NOT NULL CHECK (amount BETWEEN 1 AND 2147483647),
                PRIMARY KEY (recipe_id, ingredient_id)
            );

            CREATE TABLE favorites (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id   INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, recipe_id)
            );

            CREATE TABLE shopping_cart (
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id   INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, recipe_id)
            );

            CREATE TABLE follows (
                follower_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (follower_id, author_id),
                CHECK (follower_id <> author_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
