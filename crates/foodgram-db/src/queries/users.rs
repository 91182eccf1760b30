use rusqlite::{Connection, Row};

use crate::models::{NewUser, UserRow};
use crate::queries::{OptionalExt, as_params, placeholders};
use crate::{Database, DbError, Result};

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password, created_at";

impl Database {
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn(|conn| insert_user(conn, user))
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| select_user(conn, id))
    }

    pub fn get_users(&self, ids: &[String]) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| select_users_by_ids(conn, ids))
    }

    /// One page of users plus the total count.
    pub fn list_users(&self, limit: u32, offset: u32) -> Result<(Vec<UserRow>, i64)> {
        self.with_conn(|conn| Ok((select_users(conn, limit, offset)?, count_users(conn)?)))
    }

    pub fn set_password_hash(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| update_password(conn, id, password_hash))
    }
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        password: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, username, first_name, last_name, password)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            user.id,
            user.email,
            user.username,
            user.first_name,
            user.last_name,
            user.password_hash,
        ),
    )?;
    Ok(())
}

pub fn select_user(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
    stmt.query_row([id], user_from_row).optional()
}

pub fn select_users(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, username LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt
        .query_map([limit, offset], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn select_users_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<UserRow>> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ({})", placeholders(ids.len()));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(as_params(ids).as_slice(), user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
}

pub fn update_password(conn: &Connection, id: &str, password_hash: &str) -> Result<()> {
    let changed = conn.execute("UPDATE users SET password = ?1 WHERE id = ?2", (password_hash, id))?;
    if changed == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn add_user(db: &Database, id: &str, username: &str) {
        let email = format!("{username}@example.com");
        db.create_user(&NewUser {
            id,
            email: &email,
            username,
            first_name: "First",
            last_name: "Last",
            password_hash: "hash",
        })
        .unwrap();
    }

    #[test]
    fn create_and_fetch() {
        let db = Database::open_in_memory().unwrap();
        add_user(&db, "u1", "alice");

        let user = db.get_user("u1").unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(db.get_user("missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_reported_by_column() {
        let db = Database::open_in_memory().unwrap();
        add_user(&db, "u1", "alice");

        let err = db
            .create_user(&NewUser {
                id: "u2",
                email: "alice@example.com",
                username: "alice2",
                first_name: "A",
                last_name: "B",
                password_hash: "hash",
            })
            .unwrap_err();
        assert!(err.is_duplicate_of("users.email"));
        assert!(!err.is_duplicate_of("users.username"));
    }

    #[test]
    fn list_pages_and_counts() {
        let db = Database::open_in_memory().unwrap();
        for (id, name) in [("u1", "a"), ("u2", "b"), ("u3", "c")] {
            add_user(&db, id, name);
        }

        let (page, total) = db.list_users(2, 0).unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);

        let (page, _) = db.list_users(2, 2).unwrap();
        assert_eq!(page.len(), 1);

        let found = db.get_users(&["u1".into(), "u3".into(), "zz".into()]).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn password_update_needs_existing_user() {
        let db = Database::open_in_memory().unwrap();
        add_user(&db, "u1", "alice");

        db.set_password_hash("u1", "new-hash").unwrap();
        assert_eq!(db.get_user("u1").unwrap().unwrap().password, "new-hash");
        assert!(matches!(db.set_password_hash("nobody", "x"), Err(DbError::NotFound)));
    }
}
