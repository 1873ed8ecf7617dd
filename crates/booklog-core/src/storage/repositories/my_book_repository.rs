use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

use crate::error::{BooklogError, Result};
use crate::models::{MyBook, MyBookStatus};

use super::book_repository::{book_from_row, BOOK_COLUMNS};
use super::Repository;

pub trait MyBookRepository: Repository<Entity = MyBook, Id = i64> {
    /// Creates the (user, book) row or overwrites its status, atomically.
    fn upsert(&self, user_id: i64, book_id: i64, status: MyBookStatus) -> Result<MyBook>;
    fn find_for_user_and_book(&self, user_id: i64, book_id: i64) -> Result<Option<MyBook>>;
    /// Newest first.
    fn list_for_user(&self, user_id: i64) -> Result<Vec<MyBook>>;
    fn remove(&self, user_id: i64, book_id: i64) -> Result<bool>;
    fn count_for_user(&self, user_id: i64) -> Result<usize>;
}

pub struct SqliteMyBookRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteMyBookRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn select_sql(where_clause: &str) -> String {
        format!(
            "SELECT m.id, m.user_id, m.book_id, m.status, {BOOK_COLUMNS}
             FROM my_books m
             JOIN books b ON b.id = m.book_id
             WHERE {where_clause}"
        )
    }

    fn row_to_my_book(row: &rusqlite::Row) -> rusqlite::Result<MyBook> {
        let status_str: String = row.get(3)?;
        Ok(MyBook {
            id: row.get(0)?,
            user_id: row.get(1)?,
            book_id: row.get(2)?,
            status: MyBookStatus::from_str(&status_str).unwrap_or_default(),
            book: book_from_row(row, 4)?,
        })
    }
}

impl<'a> Repository for SqliteMyBookRepository<'a> {
    type Entity = MyBook;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let entry = self
            .conn
            .query_row(&Self::select_sql("m.id = ?1"), params![id], Self::row_to_my_book)
            .optional()?;
        Ok(entry)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM my_books WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> MyBookRepository for SqliteMyBookRepository<'a> {
    fn upsert(&self, user_id: i64, book_id: i64, status: MyBookStatus) -> Result<MyBook> {
        self.conn.execute(
            "INSERT INTO my_books (user_id, book_id, status) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, book_id) DO UPDATE SET status = excluded.status",
            params![user_id, book_id, status.to_string()],
        )?;

        self.find_for_user_and_book(user_id, book_id)?
            .ok_or(BooklogError::ReadingListEntryNotFound(book_id))
    }

    fn find_for_user_and_book(&self, user_id: i64, book_id: i64) -> Result<Option<MyBook>> {
        let entry = self
            .conn
            .query_row(
                &Self::select_sql("m.user_id = ?1 AND m.book_id = ?2"),
                params![user_id, book_id],
                Self::row_to_my_book,
            )
            .optional()?;
        Ok(entry)
    }

    fn list_for_user(&self, user_id: i64) -> Result<Vec<MyBook>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY m.id DESC", Self::select_sql("m.user_id = ?1")))?;
        let rows = stmt
            .query_map(params![user_id], Self::row_to_my_book)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn remove(&self, user_id: i64, book_id: i64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM my_books WHERE user_id = ?1 AND book_id = ?2",
            params![user_id, book_id],
        )?;
        Ok(deleted > 0)
    }

    fn count_for_user(&self, user_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM my_books WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
