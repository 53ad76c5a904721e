use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        image_name: row.get(4)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Builds a `LIKE` pattern matching `keyword` as a literal substring.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Category operations

    /// The connection mutex serializes callers within one process, so the
    /// unique-violation re-read only runs when another connection to the same
    /// database file inserts the name between our SELECT and INSERT.
    fn get_or_create_category(&self, name: &str) -> Result<i64> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM categories WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        match tx.execute("INSERT INTO categories (name) VALUES (?1)", params![name]) {
            Ok(_) => {
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(id)
            }
            // Another writer inserted the same name first; use its row.
            Err(e) if is_unique_violation(&e) => tx
                .query_row(
                    "SELECT id FROM categories WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .map_err(Error::from),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name FROM categories WHERE name = ?1",
            params![name],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Item operations

    fn create_item(&self, name: &str, category_id: i64, image_name: &str) -> Result<i64> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let result = tx.execute(
            "INSERT INTO items (name, category_id, image_name) VALUES (?1, ?2, ?3)",
            params![name, category_id, image_name],
        );

        match result {
            Ok(_) => {
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(id)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(Error::Conflict(format!("item '{name}' already exists")))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT items.id, items.name, items.category_id, categories.name, items.image_name
             FROM items JOIN categories ON items.category_id = categories.id
             WHERE items.id = ?1",
            params![id],
            item_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_item_by_name(&self, name: &str) -> Result<Option<Item>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT items.id, items.name, items.category_id, categories.name, items.image_name
             FROM items JOIN categories ON items.category_id = categories.id
             WHERE items.name = ?1",
            params![name],
            item_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT items.id, items.name, items.category_id, categories.name, items.image_name
             FROM items JOIN categories ON items.category_id = categories.id
             ORDER BY items.id",
        )?;

        let rows = stmt.query_map([], item_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn search_items(&self, keyword: &str) -> Result<Vec<Item>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT items.id, items.name, items.category_id, categories.name, items.image_name
             FROM items JOIN categories ON items.category_id = categories.id
             WHERE items.name LIKE ?1 ESCAPE '\\' OR categories.name LIKE ?1 ESCAPE '\\'
             ORDER BY items.id",
        )?;

        let rows = stmt.query_map(params![like_pattern(keyword)], item_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_item(&self, id: i64, changes: &ItemChanges) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                "SELECT items.id, items.name, items.category_id, categories.name, items.image_name
                 FROM items JOIN categories ON items.category_id = categories.id
                 WHERE items.id = ?1",
                params![id],
                item_from_row,
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        let changes = changes.clone().against(&current);
        if changes.is_empty() {
            return Ok(false);
        }

        let result = tx.execute(
            "UPDATE items SET
                 name = COALESCE(?1, name),
                 category_id = COALESCE(?2, category_id),
                 image_name = COALESCE(?3, image_name)
             WHERE id = ?4",
            params![changes.name, changes.category_id, changes.image_name, id],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(Error::Conflict(format!(
                    "item '{}' already exists",
                    changes.name.unwrap_or_default()
                )));
            }
            Err(e) => return Err(Error::from(e)),
        }

        tx.commit()?;
        Ok(true)
    }

    fn delete_item(&self, id: i64) -> Result<Option<String>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let image_name: Option<String> = tx
            .query_row(
                "SELECT image_name FROM items WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(image_name) = image_name else {
            return Ok(None);
        };

        tx.execute("DELETE FROM items WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(Some(image_name))
    }

    fn count_items_with_image(&self, image_name: &str) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM items WHERE image_name = ?1",
            params![image_name],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
