use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 2;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            role          TEXT NOT NULL CHECK(role IN ('Admin', 'Author', 'Reader')),
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS books (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            title              TEXT NOT NULL,
            author_name        TEXT NOT NULL,
            genre              TEXT,
            description        TEXT,
            status             TEXT NOT NULL CHECK(status IN ('Published', 'Hidden')) DEFAULT 'Published',
            created_by_user_id INTEGER NOT NULL REFERENCES users(id),
            created_at         TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS comments (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id    INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content    TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS my_books (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            status  TEXT NOT NULL CHECK(status IN ('WantToRead', 'Reading', 'Finished')) DEFAULT 'WantToRead',
            UNIQUE (user_id, book_id)
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_books_owner     ON books(created_by_user_id);
        CREATE INDEX IF NOT EXISTS idx_books_genre     ON books(genre);
        CREATE INDEX IF NOT EXISTS idx_comments_book   ON comments(book_id);
        CREATE INDEX IF NOT EXISTS idx_comments_user   ON comments(user_id);
        CREATE INDEX IF NOT EXISTS idx_my_books_book   ON my_books(book_id);
        ",
    )?;
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    create_tables(conn)?;
    create_indexes(conn)?;
    Ok(())
}
