use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

use crate::error::{conflict_on_unique, Result};
use crate::models::{Role, User};

use super::Repository;

pub trait UserRepository: Repository<Entity = User, Id = i64> {
    fn insert(&self, username: &str, password_hash: &str, role: Role) -> Result<User>;
    fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    /// The user together with their stored password hash.
    fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>>;
    fn set_role(&self, id: i64, role: Role) -> Result<bool>;
    fn list(&self) -> Result<Vec<User>>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteUserRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteUserRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let role_str: String = row.get(2)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            role: Role::from_str(&role_str).unwrap_or_default(),
            created_at: row.get(3)?,
        })
    }
}

impl<'a> Repository for SqliteUserRepository<'a> {
    type Entity = User;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, role, created_at FROM users WHERE id = ?1",
                params![id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> UserRepository for SqliteUserRepository<'a> {
    fn insert(&self, username: &str, password_hash: &str, role: Role) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (username, password_hash, role, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username, password_hash, role.as_str(), Utc::now()],
            )
            .map_err(|e| conflict_on_unique(e, format!("username {username} is taken")))?;

        let id = self.conn.last_insert_rowid();
        self.find_by_id(&id)?
            .ok_or_else(|| crate::error::BooklogError::UserNotFound(id.to_string()))
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, role, created_at FROM users WHERE username = ?1",
                params![username],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, username, role, created_at, password_hash
                 FROM users WHERE username = ?1",
                params![username],
                |row| Ok((Self::row_to_user(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;
        Ok(found)
    }

    fn set_role(&self, id: i64, role: Role) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;
        Ok(updated > 0)
    }

    fn list(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username, role, created_at FROM users ORDER BY id")?;
        let rows = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
