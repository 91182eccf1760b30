use std::collections::{HashMap, HashSet};

use rusqlite::Connection;

use crate::models::{RecipeRow, UserRow};
use crate::queries::recipes::{count_by_authors, select_recent_by_author};
use crate::queries::users::{select_user, user_from_row};
use crate::queries::{as_params, placeholders};
use crate::{Database, DbError, Result};

/// Recipe count and latest recipes of one followed author.
#[derive(Debug, Clone, Default)]
pub struct AuthorPreview {
    pub recipes_count: i64,
    pub recipes: Vec<RecipeRow>,
}

impl Database {
    /// Follows `author_id` and returns the author.
    ///
    /// `Constraint` for a self-follow, `NotFound` for an unknown author,
    /// `AlreadyExists` when the pair is already stored.
    pub fn follow(&self, follower_id: &str, author_id: &str) -> Result<UserRow> {
        if follower_id == author_id {
            return Err(DbError::Constraint("users cannot follow themselves".into()));
        }
        self.with_conn(|conn| {
            let author = select_user(conn, author_id)?.ok_or(DbError::NotFound)?;
            insert_follow(conn, follower_id, author_id)?;
            Ok(author)
        })
    }

    /// Returns false when the follower was not following the author.
    pub fn unfollow(&self, follower_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            select_user(conn, author_id)?.ok_or(DbError::NotFound)?;
            delete_follow(conn, follower_id, author_id)
        })
    }

    /// One page of authors followed by `follower_id`, plus the total.
    pub fn subscriptions(&self, follower_id: &str, limit: u32, offset: u32) -> Result<(Vec<UserRow>, i64)> {
        self.with_conn(|conn| {
            let rows = select_followed(conn, follower_id, limit, offset)?;
            let total = count_followed(conn, follower_id)?;
            Ok((rows, total))
        })
    }

    /// Which of `author_ids` the follower follows.
    pub fn followed_among(&self, follower_id: &str, author_ids: &[String]) -> Result<HashSet<String>> {
        self.with_conn(|conn| select_followed_among(conn, follower_id, author_ids))
    }

    /// Recipe counts and the latest `recipes_limit` recipes (all when `None`)
    /// for each author.
    pub fn author_previews(
        &self,
        author_ids: &[String],
        recipes_limit: Option<u32>,
    ) -> Result<HashMap<String, AuthorPreview>> {
        self.with_conn(|conn| {
            let counts = count_by_authors(conn, author_ids)?;
            let mut previews = HashMap::with_capacity(author_ids.len());
            for author_id in author_ids {
                let preview = AuthorPreview {
                    recipes_count: counts.get(author_id).copied().unwrap_or(0),
                    recipes: select_recent_by_author(conn, author_id, recipes_limit)?,
                };
                previews.insert(author_id.clone(), preview);
            }
            Ok(previews)
        })
    }
}

pub fn insert_follow(conn: &Connection, follower_id: &str, author_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO follows (follower_id, author_id) VALUES (?1, ?2)",
        (follower_id, author_id),
    )?;
    Ok(())
}

pub fn delete_follow(conn: &Connection, follower_id: &str, author_id: &str) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND author_id = ?2",
        (follower_id, author_id),
    )?;
    Ok(changed > 0)
}

pub fn select_followed(conn: &Connection, follower_id: &str, limit: u32, offset: u32) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.password, u.created_at
         FROM follows f
         JOIN users u ON u.id = f.author_id
         WHERE f.follower_id = ?1
         ORDER BY f.created_at DESC, u.username
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map((follower_id, limit, offset), user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_followed(conn: &Connection, follower_id: &str) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
        [follower_id],
        |r| r.get(0),
    )?)
}

pub fn select_followed_among(
    conn: &Connection,
    follower_id: &str,
    author_ids: &[String],
) -> Result<HashSet<String>> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let sql = format!(
        "SELECT author_id FROM follows WHERE follower_id = ? AND author_id IN ({})",
        placeholders(author_ids.len())
    );
    let mut params = as_params(author_ids);
    params.insert(0, &follower_id);

    let mut stmt = conn.prepare(&sql)?;
    let found = stmt
        .query_map(params.as_slice(), |row| row.get(0))?
        .collect::<std::result::Result<HashSet<String>, _>>()?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::recipes::tests::{draft, seeded};

    #[test]
    fn self_follow_is_rejected() {
        let db = seeded();
        assert!(matches!(db.follow("u1", "u1"), Err(DbError::Constraint(_))));
    }

    #[test]
    fn self_follow_is_rejected_by_the_schema() {
        let db = seeded();
        let err = db.with_conn(|conn| insert_follow(conn, "u1", "u1")).unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[test]
    fn follow_twice_then_unfollow_twice() {
        let db = seeded();

        assert_eq!(db.follow("u1", "u2").unwrap().username, "bob");
        assert!(matches!(db.follow("u1", "u2"), Err(DbError::AlreadyExists(_))));

        assert!(db.unfollow("u1", "u2").unwrap());
        assert!(!db.unfollow("u1", "u2").unwrap());
    }

    #[test]
    fn unknown_author_is_not_found() {
        let db = seeded();
        assert!(matches!(db.follow("u1", "ghost"), Err(DbError::NotFound)));
        assert!(matches!(db.unfollow("u1", "ghost"), Err(DbError::NotFound)));
    }

    #[test]
    fn subscriptions_with_previews() {
        let db = seeded();
        for name in ["a", "b", "c"] {
            db.create_recipe("u2", &draft(name, vec![1], vec![(1, 1)])).unwrap();
        }
        db.follow("u1", "u2").unwrap();

        let (authors, total) = db.subscriptions("u1", 10, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(authors[0].id, "u2");

        let ids = vec!["u2".to_string()];
        let previews = db.author_previews(&ids, Some(2)).unwrap();
        let preview = &previews["u2"];
        assert_eq!(preview.recipes_count, 3);
        assert_eq!(preview.recipes.len(), 2);
        assert_eq!(preview.recipes[0].name, "c");

        let previews = db.author_previews(&ids, None).unwrap();
        assert_eq!(previews["u2"].recipes.len(), 3);

        assert_eq!(
            db.followed_among("u1", &["u1".into(), "u2".into()]).unwrap(),
            HashSet::from(["u2".to_string()])
        );
        assert!(db.subscriptions("u2", 10, 0).unwrap().0.is_empty());
    }
}
