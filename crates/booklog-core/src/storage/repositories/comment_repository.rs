use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{BooklogError, Result};
use crate::models::Comment;

use super::Repository;

const COMMENT_SELECT: &str = "SELECT c.id, c.book_id, c.user_id, COALESCE(u.username, ''),
            c.content, c.created_at, c.updated_at
     FROM comments c
     LEFT JOIN users u ON u.id = c.user_id";

pub trait CommentRepository: Repository<Entity = Comment, Id = i64> {
    fn insert(&self, book_id: i64, user_id: i64, content: &str) -> Result<Comment>;
    fn update_content(&self, id: i64, content: &str) -> Result<Option<Comment>>;
    /// Newest first.
    fn list_for_book(&self, book_id: i64) -> Result<Vec<Comment>>;
    fn exists(&self, book_id: i64, user_id: i64, content: &str) -> Result<bool>;
    fn count_for_book(&self, book_id: i64) -> Result<usize>;
}

pub struct SqliteCommentRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCommentRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_comment(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
        Ok(Comment {
            id: row.get(0)?,
            book_id: row.get(1)?,
            user_id: row.get(2)?,
            username: row.get(3)?,
            content: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl<'a> Repository for SqliteCommentRepository<'a> {
    type Entity = Comment;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let comment = self
            .conn
            .query_row(
                &format!("{COMMENT_SELECT} WHERE c.id = ?1"),
                params![id],
                Self::row_to_comment,
            )
            .optional()?;
        Ok(comment)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> CommentRepository for SqliteCommentRepository<'a> {
    fn insert(&self, book_id: i64, user_id: i64, content: &str) -> Result<Comment> {
        self.conn.execute(
            "INSERT INTO comments (book_id, user_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![book_id, user_id, content, Utc::now()],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_by_id(&id)?.ok_or(BooklogError::CommentNotFound(id))
    }

    fn update_content(&self, id: i64, content: &str) -> Result<Option<Comment>> {
        let updated = self.conn.execute(
            "UPDATE comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
            params![content, Utc::now(), id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.find_by_id(&id)
    }

    fn list_for_book(&self, book_id: i64) -> Result<Vec<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT} WHERE c.book_id = ?1 ORDER BY c.id DESC"))?;
        let rows = stmt
            .query_map(params![book_id], Self::row_to_comment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn exists(&self, book_id: i64, user_id: i64, content: &str) -> Result<bool> {
        let found = self
            .conn
            .prepare(
                "SELECT 1 FROM comments WHERE book_id = ?1 AND user_id = ?2 AND content = ?3",
            )?
            .exists(params![book_id, user_id, content])?;
        Ok(found)
    }

    fn count_for_book(&self, book_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE book_id = ?1",
            params![book_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
