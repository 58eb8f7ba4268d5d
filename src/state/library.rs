use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{debug, info};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;

use super::data::{ItemCategory, ShoppingItem};
use super::store::{ItemStore, Snapshot};
use crate::config::Config;
use crate::error::Result;

/// Column list shared by every SELECT so `row_to_item` can read by position
const ITEM_COLUMNS: &str = "id, name, quantity, is_bought, price, category, timestamp, notes";

/// Order of the live collection: pending items first, newest first within each group
const DEFAULT_ORDER: &str = "ORDER BY is_bought ASC, timestamp DESC, id DESC";

/// The Library manages the SQLite shopping list database.
///
/// All access goes through one connection behind a mutex, which makes the
/// library the single writer. After every committed mutation the full
/// collection is re-read and published to `observe_all` subscribers.
pub struct Library {
    inner: Mutex<Inner>,
    db_path: Option<PathBuf>,
    items: watch::Sender<Snapshot>,
}

struct Inner {
    conn: Connection,
    /// Last creation timestamp handed out, keeps stamps strictly increasing
    last_timestamp: i64,
}

impl Library {
    /// Open (or create) the database at `path`.
    /// The parent directory is created when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        info!("📁 Database opened at: {}", path.display());

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Create a throwaway in-memory database (tests, previews)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    /// Open the database named by the config, falling back to the
    /// per-user data directory
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.database_path()?;
        Self::open(path)
    }

    fn init(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        init_schema(&conn)?;

        let last_timestamp: i64 = conn.query_row(
            "SELECT COALESCE(MAX(timestamp), 0) FROM shopping_items",
            [],
            |row| row.get(0),
        )?;
        let snapshot = load_all(&conn)?;
        debug!("Loaded {} items from the shopping list", snapshot.len());

        let (items, _) = watch::channel(Arc::new(snapshot));

        Ok(Library {
            inner: Mutex::new(Inner { conn, last_timestamp }),
            db_path,
            items,
        })
    }

    /// Get the path to the database file (`None` for in-memory databases)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Remove every item, bought or not
    pub fn delete_all(&self) -> Result<usize> {
        let inner = self.lock();
        let removed = inner.conn.execute("DELETE FROM shopping_items", [])?;
        info!("🗑️  Cleared the list ({} items)", removed);
        self.publish(&inner.conn)?;
        Ok(removed)
    }

    /// Get a count of items on the list
    pub fn count(&self) -> Result<usize> {
        let inner = self.lock();
        let count: i64 = inner
            .conn
            .query_row("SELECT COUNT(*) FROM shopping_items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get a count of items already bought
    pub fn bought_count(&self) -> Result<usize> {
        let inner = self.lock();
        let count: i64 = inner.conn.query_row(
            "SELECT COUNT(*) FROM shopping_items WHERE is_bought = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Items of one category, newest first
    pub fn get_by_category(&self, category: ItemCategory) -> Result<Vec<ShoppingItem>> {
        let inner = self.lock();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_items WHERE category = ?1 ORDER BY timestamp DESC"
        );
        query_items(&inner.conn, &sql, params![category])
    }

    pub fn get_all_bought(&self) -> Result<Vec<ShoppingItem>> {
        let inner = self.lock();
        let sql = format!("SELECT {ITEM_COLUMNS} FROM shopping_items WHERE is_bought = 1 {DEFAULT_ORDER}");
        query_items(&inner.conn, &sql, [])
    }

    pub fn get_all_pending(&self) -> Result<Vec<ShoppingItem>> {
        let inner = self.lock();
        let sql = format!("SELECT {ITEM_COLUMNS} FROM shopping_items WHERE is_bought = 0 {DEFAULT_ORDER}");
        query_items(&inner.conn, &sql, [])
    }

    /// SQL-side search over name and notes.
    /// SQLite's LIKE only folds ASCII case; the view pipeline does its own
    /// matching and does not use this.
    pub fn search(&self, query: &str) -> Result<Vec<ShoppingItem>> {
        let inner = self.lock();
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_items
             WHERE name LIKE '%' || ?1 || '%' OR notes LIKE '%' || ?1 || '%'
             {DEFAULT_ORDER}"
        );
        query_items(&inner.conn, &sql, params![query])
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-statement leaves nothing half-written that SQLite
        // would not already have rolled back
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-read the collection and push it to every subscriber.
    /// Called with the lock held so snapshots follow mutation order.
    fn publish(&self, conn: &Connection) -> Result<()> {
        let snapshot = load_all(conn)?;
        debug!("Publishing snapshot with {} items", snapshot.len());
        self.items.send_replace(Arc::new(snapshot));
        Ok(())
    }
}

impl Inner {
    /// Keep an explicit timestamp, or hand out a fresh one that is
    /// strictly greater than any stamp given before
    fn stamp(&mut self, timestamp: i64) -> i64 {
        let stamped = if timestamp == 0 {
            Utc::now().timestamp_millis().max(self.last_timestamp + 1)
        } else {
            timestamp
        };
        self.last_timestamp = self.last_timestamp.max(stamped);
        stamped
    }
}

impl ItemStore for Library {
    fn observe_all(&self) -> watch::Receiver<Snapshot> {
        self.items.subscribe()
    }

    fn get_all(&self) -> Result<Vec<ShoppingItem>> {
        let inner = self.lock();
        load_all(&inner.conn)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<ShoppingItem>> {
        let inner = self.lock();
        let sql = format!("SELECT {ITEM_COLUMNS} FROM shopping_items WHERE id = ?1");
        let item = inner
            .conn
            .query_row(&sql, params![id], row_to_item)
            .optional()?;
        Ok(item)
    }

    fn insert(&self, item: &ShoppingItem) -> Result<i64> {
        item.validate()?;

        let mut inner = self.lock();
        let mut item = item.clone();
        item.timestamp = inner.stamp(item.timestamp);

        let id = write_item(&inner.conn, &item)?;
        debug!("Inserted item {} ({})", id, item.name);

        self.publish(&inner.conn)?;
        Ok(id)
    }

    fn insert_all(&self, items: &[ShoppingItem]) -> Result<Vec<i64>> {
        for item in items {
            item.validate()?;
        }

        let mut inner = self.lock();
        let mut stamped = Vec::with_capacity(items.len());
        for item in items {
            let mut item = item.clone();
            item.timestamp = inner.stamp(item.timestamp);
            stamped.push(item);
        }

        let tx = inner.conn.transaction()?;
        let mut ids = Vec::with_capacity(stamped.len());
        for item in &stamped {
            ids.push(write_item(&tx, item)?);
        }
        tx.commit()?;

        info!("Inserted {} items", ids.len());
        self.publish(&inner.conn)?;
        Ok(ids)
    }

    fn update(&self, item: &ShoppingItem) -> Result<bool> {
        item.validate()?;

        let inner = self.lock();
        let changed = inner.conn.execute(
            "UPDATE shopping_items
             SET name = ?1, quantity = ?2, is_bought = ?3, price = ?4,
                 category = ?5, timestamp = ?6, notes = ?7
             WHERE id = ?8",
            params![
                item.name,
                item.quantity,
                item.is_bought,
                item.price,
                item.category,
                item.timestamp,
                item.notes,
                item.id,
            ],
        )?;

        if changed == 0 {
            debug!("Update skipped, no item with id {}", item.id);
            return Ok(false);
        }

        self.publish(&inner.conn)?;
        Ok(true)
    }

    fn delete(&self, item: &ShoppingItem) -> Result<bool> {
        let inner = self.lock();
        let removed = inner
            .conn
            .execute("DELETE FROM shopping_items WHERE id = ?1", params![item.id])?;

        if removed == 0 {
            return Ok(false);
        }

        debug!("Deleted item {} ({})", item.id, item.name);
        self.publish(&inner.conn)?;
        Ok(true)
    }

    fn delete_all_bought(&self) -> Result<usize> {
        let inner = self.lock();
        let removed = inner
            .conn
            .execute("DELETE FROM shopping_items WHERE is_bought = 1", [])?;

        info!("🧹 Cleared {} bought items", removed);
        self.publish(&inner.conn)?;
        Ok(removed)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl ToSql for ItemCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ItemCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(ItemCategory::from_name)
    }
}

/// Initialize the database schema.
/// Creates the table and indexes if they don't exist.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS shopping_items (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            quantity        INTEGER NOT NULL,
            is_bought       INTEGER NOT NULL DEFAULT 0,
            price           REAL NOT NULL DEFAULT 0,
            category        TEXT NOT NULL DEFAULT 'OTHER',
            timestamp       INTEGER NOT NULL,
            notes           TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    // Backs the default "pending first, newest first" ordering
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_bought_timestamp
         ON shopping_items(is_bought, timestamp DESC)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_category
         ON shopping_items(category)",
        [],
    )?;

    debug!("✅ Database schema initialized");
    Ok(())
}

/// Insert, or replace when the item already carries an id
fn write_item(conn: &Connection, item: &ShoppingItem) -> Result<i64> {
    if item.id == 0 {
        conn.execute(
            "INSERT INTO shopping_items
                (name, quantity, is_bought, price, category, timestamp, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.name,
                item.quantity,
                item.is_bought,
                item.price,
                item.category,
                item.timestamp,
                item.notes,
            ],
        )?;
    } else {
        conn.execute(
            "INSERT OR REPLACE INTO shopping_items
                (id, name, quantity, is_bought, price, category, timestamp, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.id,
                item.name,
                item.quantity,
                item.is_bought,
                item.price,
                item.category,
                item.timestamp,
                item.notes,
            ],
        )?;
    }
    Ok(conn.last_insert_rowid())
}

fn load_all(conn: &Connection) -> Result<Vec<ShoppingItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM shopping_items {DEFAULT_ORDER}");
    query_items(conn, &sql, [])
}

fn query_items<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<ShoppingItem>> {
    let mut stmt = conn.prepare(sql)?;
    let item_iter = stmt.query_map(params, row_to_item)?;

    let mut items = Vec::new();
    for item in item_iter {
        items.push(item?);
    }

    Ok(items)
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<ShoppingItem> {
    Ok(ShoppingItem {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        is_bought: row.get(3)?,
        price: row.get(4)?,
        category: row.get(5)?,
        timestamp: row.get(6)?,
        notes: row.get(7)?,
    })
}
