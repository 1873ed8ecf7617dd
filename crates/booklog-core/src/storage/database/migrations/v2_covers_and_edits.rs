use rusqlite::Connection;

use super::Migration;
use crate::error::Result;

pub struct V2CoversAndEdits;

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let exists = conn
        .prepare("SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2")?
        .exists(rusqlite::params![table, column])?;
    Ok(exists)
}

impl Migration for V2CoversAndEdits {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Add books.cover_image_url and comments.updated_at"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        if !has_column(conn, "books", "cover_image_url")? {
            conn.execute_batch("ALTER TABLE books ADD COLUMN cover_image_url TEXT;")?;
        }
        if !has_column(conn, "comments", "updated_at")? {
            conn.execute_batch("ALTER TABLE comments ADD COLUMN updated_at TEXT;")?;
        }
        Ok(())
    }
}
