mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{get_applied_versions, run_migrations, Migration};
pub use schema::{init_schema, SCHEMA_VERSION};

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::Connection;

use crate::error::{BooklogError, Result};
use crate::models::{
    normalize_content, normalize_username, Book, BookDraft, BookFilter, Comment, MyBook,
    MyBookStatus, Role, User,
};
use crate::password::{hash_password, validate_password, verify_password};
use crate::policy::{
    can_view_book, ensure_can_create_books, ensure_can_modify_book, ensure_can_modify_comment,
    Actor,
};

use super::repositories::{
    BookRepository, CommentRepository, MyBookRepository, Repository, SqliteBookRepository,
    SqliteCommentRepository, SqliteMyBookRepository, SqliteUserRepository, UserRepository,
};

pub const DEFAULT_PASSWORD_COST: u32 = 10;

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// Loads a book and hides it from callers who may not see it.
fn visible_book(conn: &Connection, viewer: Option<&Actor>, id: i64) -> Result<Book> {
    SqliteBookRepository::new(conn)
        .find_by_id(&id)?
        .filter(|book| can_view_book(viewer, book))
        .ok_or(BooklogError::BookNotFound(id))
}

/// The storage facade. Every operation that checks access and then writes
/// does both under one connection lock.
pub struct Database {
    pool: ConnectionPool,
    password_cost: u32,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self {
            pool,
            password_cost: DEFAULT_PASSWORD_COST,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self {
            pool,
            password_cost: DEFAULT_PASSWORD_COST,
        })
    }

    /// bcrypt work factor used for new password hashes.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    // ─── Accounts ──────────────────────────────────────────

    /// Self-service sign-up. Only Reader and Author may be chosen.
    pub fn register(&self, username: &str, password: &str, role: Role) -> Result<User> {
        if !role.is_self_assignable() {
            return Err(BooklogError::ValidationError("Role must be Reader or Author.".into()));
        }
        self.create_user(username, password, role)
    }

    /// Creates an account with any role.
    pub fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let username = normalize_username(username)?;
        validate_password(password)?;
        let hash = hash_password(password, self.password_cost)?;

        let conn = self.pool.get_connection();
        let user = SqliteUserRepository::new(&conn)
            .insert(&username, &hash, role)
            .map_err(|e| match e {
                BooklogError::Conflict(_) => BooklogError::DuplicateUser(username.clone()),
                other => other,
            })?;

        tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let (user, hash) = {
            let conn = self.pool.get_connection();
            SqliteUserRepository::new(&conn)
                .find_credentials(username.trim())?
                .ok_or(BooklogError::InvalidCredentials)?
        };

        if verify_password(password, &hash) {
            Ok(user)
        } else {
            Err(BooklogError::InvalidCredentials)
        }
    }

    pub fn find_user(&self, id: i64) -> Result<User> {
        let conn = self.pool.get_connection();
        SqliteUserRepository::new(&conn)
            .find_by_id(&id)?
            .ok_or_else(|| BooklogError::UserNotFound(id.to_string()))
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get_connection();
        SqliteUserRepository::new(&conn).find_by_username(username.trim())
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.pool.get_connection();
        SqliteUserRepository::new(&conn).list()
    }

    pub fn set_user_role(&self, username: &str, role: Role) -> Result<User> {
        let conn = self.pool.get_connection();
        let repo = SqliteUserRepository::new(&conn);
        let user = repo
            .find_by_username(username.trim())?
            .ok_or_else(|| BooklogError::UserNotFound(username.to_string()))?;
        repo.set_role(user.id, role)?;
        Ok(User { role, ..user })
    }

    // ─── Books ─────────────────────────────────────────────

    pub fn list_books(&self, viewer: Option<&Actor>, filter: &BookFilter) -> Result<Vec<Book>> {
        let conn = self.pool.get_connection();
        let books = SqliteBookRepository::new(&conn).list(filter)?;
        Ok(books
            .into_iter()
            .filter(|book| can_view_book(viewer, book))
            .collect())
    }

    /// Distinct genres of the books `viewer` can see, sorted
    /// case-insensitively.
    pub fn genres(&self, viewer: Option<&Actor>) -> Result<Vec<String>> {
        let mut by_key: BTreeMap<String, String> = BTreeMap::new();
        for book in self.list_books(viewer, &BookFilter::default())? {
            if let Some(genre) = book.genre {
                by_key.entry(genre.to_lowercase()).or_insert(genre);
            }
        }
        Ok(by_key.into_values().collect())
    }

    pub fn get_book(&self, viewer: Option<&Actor>, id: i64) -> Result<Book> {
        let conn = self.pool.get_connection();
        visible_book(&conn, viewer, id)
    }

    pub fn create_book(&self, actor: &Actor, draft: BookDraft) -> Result<Book> {
        ensure_can_create_books(actor)?;
        let draft = draft.normalized()?;

        let conn = self.pool.get_connection();
        let book = SqliteBookRepository::new(&conn).insert(actor.user_id, &draft)?;
        tracing::info!(book_id = book.id, owner = actor.user_id, title = %book.title, "book created");
        Ok(book)
    }

    pub fn update_book(&self, actor: &Actor, id: i64, draft: BookDraft) -> Result<Book> {
        let conn = self.pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        let book = visible_book(&conn, Some(actor), id)?;
        ensure_can_modify_book(actor, &book)?;
        let draft = draft.normalized()?;

        repo.update(id, &draft)?.ok_or(BooklogError::BookNotFound(id))
    }

    pub fn delete_book(&self, actor: &Actor, id: i64) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqliteBookRepository::new(&conn);

        let book = visible_book(&conn, Some(actor), id)?;
        ensure_can_modify_book(actor, &book)?;

        if !repo.delete(&id)? {
            return Err(BooklogError::BookNotFound(id));
        }
        tracing::info!(book_id = id, by = actor.user_id, "book deleted");
        Ok(())
    }

    pub fn count_books(&self) -> Result<usize> {
        let conn = self.pool.get_connection();
        SqliteBookRepository::new(&conn).count()
    }

    // ─── Comments ──────────────────────────────────────────

    pub fn list_comments(&self, viewer: Option<&Actor>, book_id: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get_connection();
        visible_book(&conn, viewer, book_id)?;
        SqliteCommentRepository::new(&conn).list_for_book(book_id)
    }

    pub fn add_comment(&self, actor: &Actor, book_id: i64, content: &str) -> Result<Comment> {
        let content = normalize_content(content)?;

        let conn = self.pool.get_connection();
        visible_book(&conn, Some(actor), book_id)?;
        SqliteCommentRepository::new(&conn).insert(book_id, actor.user_id, &content)
    }

    pub fn update_comment(&self, actor: &Actor, id: i64, content: &str) -> Result<Comment> {
        let conn = self.pool.get_connection();
        let repo = SqliteCommentRepository::new(&conn);

        let comment = repo.find_by_id(&id)?.ok_or(BooklogError::CommentNotFound(id))?;
        ensure_can_modify_comment(actor, &comment)?;
        let content = normalize_content(content)?;

        repo.update_content(id, &content)?
            .ok_or(BooklogError::CommentNotFound(id))
    }

    pub fn delete_comment(&self, actor: &Actor, id: i64) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqliteCommentRepository::new(&conn);

        let comment = repo.find_by_id(&id)?.ok_or(BooklogError::CommentNotFound(id))?;
        ensure_can_modify_comment(actor, &comment)?;

        if !repo.delete(&id)? {
            return Err(BooklogError::CommentNotFound(id));
        }
        Ok(())
    }

    // ─── Reading list ──────────────────────────────────────

    pub fn list_my_books(&self, actor: &Actor) -> Result<Vec<MyBook>> {
        let conn = self.pool.get_connection();
        SqliteMyBookRepository::new(&conn).list_for_user(actor.user_id)
    }

    /// Adds the book to the caller's list, or overwrites the status of the
    /// existing entry.
    pub fn set_my_book_status(
        &self,
        actor: &Actor,
        book_id: i64,
        status: MyBookStatus,
    ) -> Result<MyBook> {
        let conn = self.pool.get_connection();
        visible_book(&conn, Some(actor), book_id)?;
        SqliteMyBookRepository::new(&conn).upsert(actor.user_id, book_id, status)
    }

    pub fn remove_my_book(&self, actor: &Actor, book_id: i64) -> Result<()> {
        let conn = self.pool.get_connection();
        if SqliteMyBookRepository::new(&conn).remove(actor.user_id, book_id)? {
            Ok(())
        } else {
            Err(BooklogError::ReadingListEntryNotFound(book_id))
        }
    }
}
