use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::str::FromStr;

use crate::error::{BooklogError, Result};
use crate::models::{Book, BookDraft, BookFilter, VisibilityStatus};

use super::Repository;

pub(crate) const BOOK_COLUMNS: &str = "b.id, b.title, b.author_name, b.genre, b.description,
     b.cover_image_url, b.status, b.created_by_user_id, b.created_at";

/// Maps the nine [`BOOK_COLUMNS`] starting at column `offset`.
pub(crate) fn book_from_row(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Book> {
    let status_str: String = row.get(offset + 6)?;
    Ok(Book {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        author_name: row.get(offset + 2)?,
        genre: row.get(offset + 3)?,
        description: row.get(offset + 4)?,
        cover_image_url: row.get(offset + 5)?,
        status: VisibilityStatus::from_str(&status_str).unwrap_or_default(),
        created_by_user_id: row.get(offset + 7)?,
        created_at: row.get(offset + 8)?,
    })
}

pub trait BookRepository: Repository<Entity = Book, Id = i64> {
    fn insert(&self, owner_id: i64, draft: &BookDraft) -> Result<Book>;
    /// Rewrites the editable fields. The owner column is left alone.
    fn update(&self, id: i64, draft: &BookDraft) -> Result<Option<Book>>;
    /// Newest first.
    fn list(&self, filter: &BookFilter) -> Result<Vec<Book>>;
    fn find_by_title(&self, title: &str) -> Result<Option<Book>>;
    fn count(&self) -> Result<usize>;
}

pub struct SqliteBookRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBookRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<Book> {
        book_from_row(row, 0)
    }
}

impl<'a> Repository for SqliteBookRepository<'a> {
    type Entity = Book;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = ?1"),
                params![id],
                Self::row_to_book,
            )
            .optional()?;
        Ok(book)
    }

    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl<'a> BookRepository for SqliteBookRepository<'a> {
    fn insert(&self, owner_id: i64, draft: &BookDraft) -> Result<Book> {
        self.conn.execute(
            "INSERT INTO books
                (title, author_name, genre, description, cover_image_url, status,
                 created_by_user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                draft.title,
                draft.author_name,
                draft.genre,
                draft.description,
                draft.cover_image_url,
                draft.status.to_string(),
                owner_id,
                Utc::now(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_by_id(&id)?.ok_or(BooklogError::BookNotFound(id))
    }

    fn update(&self, id: i64, draft: &BookDraft) -> Result<Option<Book>> {
        let updated = self.conn.execute(
            "UPDATE books
             SET title = ?1, author_name = ?2, genre = ?3, description = ?4,
                 cover_image_url = ?5, status = ?6
             WHERE id = ?7",
            params![
                draft.title,
                draft.author_name,
                draft.genre,
                draft.description,
                draft.cover_image_url,
                draft.status.to_string(),
                id,
            ],
        )?;

        if updated == 0 {
            return Ok(None);
        }
        self.find_by_id(&id)
    }

    fn list(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<rusqlite::types::Value> = Vec::new();

        // SQLite lower() only folds ASCII, so the text search runs here.
        let needle = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        if let Some(genre) = filter.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            clauses.push("b.genre = ? COLLATE NOCASE");
            values.push(genre.to_string().into());
        }
        if let Some(owner_id) = filter.owner_id {
            clauses.push("b.created_by_user_id = ?");
            values.push(owner_id.into());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books b {where_sql} ORDER BY b.id DESC"
        ))?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::row_to_book)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(match needle {
            Some(needle) => rows
                .into_iter()
                .filter(|book| matches_query(book, &needle))
                .collect(),
            None => rows,
        })
    }

    fn find_by_title(&self, title: &str) -> Result<Option<Book>> {
        let book = self
            .conn
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.title = ?1 ORDER BY b.id LIMIT 1"),
                params![title],
                Self::row_to_book,
            )
            .optional()?;
        Ok(book)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Case-insensitive substring match on title or author; `needle` is
/// already lowercased.
fn matches_query(book: &Book, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle) || book.author_name.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::storage::database::{run_migrations, ConnectionPool};
    use crate::storage::repositories::{SqliteUserRepository, UserRepository};

    fn setup() -> (ConnectionPool, i64, i64) {
        let pool = ConnectionPool::open_in_memory().unwrap();
        let (a, b) = {
            let conn = pool.get_connection();
            run_migrations(&conn).unwrap();
            let users = SqliteUserRepository::new(&conn);
            let a = users.insert("author1", "h", Role::Author).unwrap().id;
            let b = users.insert("author2", "h", Role::Author).unwrap().id;
            (a, b)
        };
        (pool, a, b)
    }

    #[test]
    fn test_insert_sets_owner_and_defaults() {
        let (pool, owner, _) = setup();
        let conn = pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        let book = repo.insert(owner, &BookDraft::new("Dune", "Frank Herbert")).unwrap();
        assert_eq!(book.created_by_user_id, owner);
        assert_eq!(book.status, VisibilityStatus::Published);
        assert!(book.genre.is_none());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_update_keeps_owner() {
        let (pool, owner, _) = setup();
        let conn = pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        let book = repo.insert(owner, &BookDraft::new("Old", "A")).unwrap();
        let draft = BookDraft::new("New", "B").with_status(VisibilityStatus::Hidden);
        let updated = repo.update(book.id, &draft).unwrap().unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.status, VisibilityStatus::Hidden);
        assert_eq!(updated.created_by_user_id, owner);
        assert_eq!(updated.created_at, book.created_at);

        assert!(repo.update(book.id + 100, &draft).unwrap().is_none());
    }

    #[test]
    fn test_list_orders_newest_first() {
        let (pool, owner, _) = setup();
        let conn = pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        for title in ["B1", "B2", "B3"] {
            repo.insert(owner, &BookDraft::new(title, "A")).unwrap();
        }
        let books = repo.list(&BookFilter::default()).unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["B3", "B2", "B1"]);
    }

    #[test]
    fn test_list_filters() {
        let (pool, a, b) = setup();
        let conn = pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        repo.insert(a, &BookDraft::new("The Hobbit", "J.R.R. Tolkien").with_genre("Fantasy"))
            .unwrap();
        repo.insert(a, &BookDraft::new("Dune", "Frank Herbert").with_genre("Sci-Fi"))
            .unwrap();
        repo.insert(b, &BookDraft::new("Deep Work", "Cal Newport").with_genre("Productivity"))
            .unwrap();

        let by_title = repo.list(&BookFilter::default().with_query("hobb")).unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "The Hobbit");

        let by_author = repo.list(&BookFilter::default().with_query("HERBERT")).unwrap();
        assert_eq!(by_author.len(), 1);

        let by_genre = repo.list(&BookFilter::default().with_genre("sci-fi")).unwrap();
        assert_eq!(by_genre.len(), 1);
        assert_eq!(by_genre[0].title, "Dune");

        let by_owner = repo.list(&BookFilter::default().with_owner(b)).unwrap();
        assert_eq!(by_owner.len(), 1);
        assert_eq!(by_owner[0].title, "Deep Work");

        let combined = repo
            .list(&BookFilter::default().with_owner(a).with_query("work"))
            .unwrap();
        assert!(combined.is_empty());

        let blank = repo.list(&BookFilter::default().with_query("   ")).unwrap();
        assert_eq!(blank.len(), 3);
    }

    #[test]
    fn test_query_folds_unicode_case() {
        let (pool, a, _) = setup();
        let conn = pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        repo.insert(a, &BookDraft::new("Élan vital", "Henri Bergson")).unwrap();
        repo.insert(a, &BookDraft::new("Der Prozess", "Ödön von Horváth")).unwrap();
        repo.insert(a, &BookDraft::new("Dune", "Frank Herbert")).unwrap();

        let elan = repo.list(&BookFilter::default().with_query("élan")).unwrap();
        assert_eq!(elan.len(), 1);
        assert_eq!(elan[0].title, "Élan vital");

        let odon = repo.list(&BookFilter::default().with_query("ÖDÖN")).unwrap();
        assert_eq!(odon.len(), 1);
        assert_eq!(odon[0].author_name, "Ödön von Horváth");

        let with_owner = repo
            .list(&BookFilter::default().with_query("horváth").with_owner(a))
            .unwrap();
        assert_eq!(with_owner.len(), 1);
    }

    #[test]
    fn test_find_by_title_and_delete() {
        let (pool, owner, _) = setup();
        let conn = pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        let book = repo.insert(owner, &BookDraft::new("Sapiens", "Harari")).unwrap();
        assert_eq!(repo.find_by_title("Sapiens").unwrap().unwrap().id, book.id);
        assert!(repo.find_by_title("Missing").unwrap().is_none());

        assert!(repo.delete(&book.id).unwrap());
        assert!(repo.find_by_id(&book.id).unwrap().is_none());
    }
}
