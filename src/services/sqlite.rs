//! SQLite-backed account, wallet, inventory and farm store
//!
//! Balance changes are single `balance = balance + ?` statements, never a read
//! followed by a write, so two concurrent purchases cannot lose an update.
//! Steps that touch more than one row run inside a transaction. User ids are
//! stored as text because snowflakes overflow `i64`.
//!
//! Every query runs on the blocking pool while holding the one connection.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use sqlite::{Connection, State};
use std::sync::{Arc, Mutex};

use super::{AccountStore, FarmStore, InventoryStore, Plot, WalletField, WalletRecord, WalletStore};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        user_id TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS wallets (
        user_id TEXT PRIMARY KEY,
        balance INTEGER NOT NULL DEFAULT 0,
        updated_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS inventory (
        user_id TEXT NOT NULL,
        item TEXT NOT NULL,
        count INTEGER NOT NULL,
        PRIMARY KEY (user_id, item)
    );
    CREATE TABLE IF NOT EXISTS plots (
        user_id TEXT NOT NULL,
        slot INTEGER NOT NULL,
        crop TEXT NOT NULL DEFAULT '',
        planted_at INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (user_id, slot)
    );
";

pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;
        connection.execute(SCHEMA)?;
        info!("Opened database at {path}");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Run `f` against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let connection = connection
                .lock()
                .map_err(|_| anyhow!("database connection lock poisoned"))?;
            f(&connection)
        })
        .await
        .context("database task failed")?
    }
}

/// Run `f` between `BEGIN` and `COMMIT`, rolling back when it fails
fn transaction<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => {
            conn.execute("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute("ROLLBACK") {
                warn!("Rollback failed: {rollback}");
            }
            Err(e)
        }
    }
}

fn exists(conn: &Connection, table: &str, user_id: &str) -> Result<bool> {
    let mut statement = conn.prepare(format!("SELECT 1 FROM {table} WHERE user_id = ?"))?;
    statement.bind((1, user_id))?;
    Ok(matches!(statement.next()?, State::Row))
}

fn delete_rows(conn: &Connection, table: &str, user_id: &str) -> Result<()> {
    let mut statement = conn.prepare(format!("DELETE FROM {table} WHERE user_id = ?"))?;
    statement.bind((1, user_id))?;
    statement.next()?;
    Ok(())
}

fn item_count(conn: &Connection, user_id: &str, item: &str) -> Result<i64> {
    let mut statement = conn.prepare("SELECT count FROM inventory WHERE user_id = ? AND item = ?")?;
    statement.bind((1, user_id))?;
    statement.bind((2, item))?;
    if matches!(statement.next()?, State::Row) {
        Ok(statement.read::<i64, _>("count")?)
    } else {
        Ok(0)
    }
}

/// Subtract from a count known to cover `amount`, dropping emptied rows
fn remove_items(conn: &Connection, user_id: &str, item: &str, amount: i64) -> Result<()> {
    let mut statement = conn.prepare(
        "UPDATE inventory SET count = count - :amount WHERE user_id = :id AND item = :item",
    )?;
    statement.bind((":amount", amount))?;
    statement.bind((":id", user_id))?;
    statement.bind((":item", item))?;
    statement.next()?;

    let mut statement = conn.prepare("DELETE FROM inventory WHERE user_id = ? AND item = ? AND count <= 0")?;
    statement.bind((1, user_id))?;
    statement.bind((2, item))?;
    statement.next()?;
    Ok(())
}

fn plot_count(conn: &Connection, user_id: &str) -> Result<usize> {
    let mut statement = conn.prepare("SELECT COUNT(*) AS plots FROM plots WHERE user_id = ?")?;
    statement.bind((1, user_id))?;
    statement.next()?;
    Ok(statement.read::<i64, _>("plots")?.max(0) as usize)
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn user_exists(&self, user_id: u64) -> Result<bool> {
        self.run(move |conn| exists(conn, "accounts", &user_id.to_string()))
            .await
    }

    async fn create_user(&self, user_id: u64) -> Result<bool> {
        self.run(move |conn| {
            let mut statement = conn.prepare(
                "INSERT INTO accounts (user_id, created_at) VALUES (?, ?) ON CONFLICT(user_id) DO NOTHING",
            )?;
            statement.bind((1, user_id.to_string().as_str()))?;
            statement.bind((2, Utc::now().timestamp_millis()))?;
            statement.next()?;
            Ok(conn.change_count() > 0)
        })
        .await
    }

    async fn delete_user(&self, user_id: u64) -> Result<bool> {
        self.run(move |conn| {
            let id = user_id.to_string();
            transaction(conn, |conn| {
                for table in ["wallets", "inventory", "plots"] {
                    delete_rows(conn, table, &id)?;
                }
                delete_rows(conn, "accounts", &id)?;
                Ok(conn.change_count() > 0)
            })
        })
        .await
    }
}

#[async_trait]
impl WalletStore for SqliteStore {
    async fn get_wallet_fields(
        &self,
        user_id: u64,
        fields: &[WalletField],
    ) -> Result<Option<WalletRecord>> {
        let fields = fields.to_vec();
        self.run(move |conn| {
            let mut statement =
                conn.prepare("SELECT balance, updated_at FROM wallets WHERE user_id = ?")?;
            statement.bind((1, user_id.to_string().as_str()))?;
            if !matches!(statement.next()?, State::Row) {
                return Ok(None);
            }
            let mut record = WalletRecord::default();
            for field in fields {
                match field {
                    WalletField::Balance => record.balance = Some(statement.read::<i64, _>("balance")?),
                    WalletField::UpdatedAt => {
                        record.updated_at = Some(statement.read::<i64, _>("updated_at")?)
                    }
                }
            }
            Ok(Some(record))
        })
        .await
    }

    async fn adjust_wallet(&self, user_id: u64, delta: i64, upsert: bool) -> Result<bool> {
        let now = Utc::now().timestamp_millis();
        self.run(move |conn| {
            let sql = if upsert {
                "INSERT INTO wallets (user_id, balance, updated_at) VALUES (:id, :delta, :now)
                 ON CONFLICT(user_id) DO UPDATE SET balance = balance + excluded.balance, updated_at = excluded.updated_at"
            } else {
                "UPDATE wallets SET balance = balance + :delta, updated_at = :now WHERE user_id = :id"
            };
            let mut statement = conn.prepare(sql)?;
            statement.bind((":id", user_id.to_string().as_str()))?;
            statement.bind((":delta", delta))?;
            statement.bind((":now", now))?;
            statement.next()?;
            let changed = conn.change_count() > 0;
            debug!("Wallet {user_id} adjusted by {delta} (changed: {changed})");
            Ok(changed)
        })
        .await
    }

    async fn spend_wallet(&self, user_id: u64, amount: i64) -> Result<bool> {
        let now = Utc::now().timestamp_millis();
        self.run(move |conn| {
            let mut statement = conn.prepare(
                "UPDATE wallets SET balance = balance - :amount, updated_at = :now
                 WHERE user_id = :id AND balance >= :amount",
            )?;
            statement.bind((":id", user_id.to_string().as_str()))?;
            statement.bind((":amount", amount))?;
            statement.bind((":now", now))?;
            statement.next()?;
            Ok(conn.change_count() > 0)
        })
        .await
    }
}

#[async_trait]
impl InventoryStore for SqliteStore {
    async fn get_inventory(&self, user_id: u64) -> Result<Vec<(String, i64)>> {
        self.run(move |conn| {
            let mut statement = conn.prepare(
                "SELECT item, count FROM inventory WHERE user_id = ? AND count > 0 ORDER BY item",
            )?;
            statement.bind((1, user_id.to_string().as_str()))?;
            let mut items = Vec::new();
            while let State::Row = statement.next()? {
                items.push((
                    statement.read::<String, _>("item")?,
                    statement.read::<i64, _>("count")?,
                ));
            }
            Ok(items)
        })
        .await
    }

    async fn adjust_inventory(&self, user_id: u64, item: &str, delta: i64) -> Result<Option<i64>> {
        let item = item.to_string();
        self.run(move |conn| {
            let id = user_id.to_string();
            transaction(conn, |conn| {
                if delta >= 0 {
                    let mut statement = conn.prepare(
                        "INSERT INTO inventory (user_id, item, count) VALUES (:id, :item, :delta)
                         ON CONFLICT(user_id, item) DO UPDATE SET count = count + excluded.count",
                    )?;
                    statement.bind((":id", id.as_str()))?;
                    statement.bind((":item", item.as_str()))?;
                    statement.bind((":delta", delta))?;
                    statement.next()?;
                } else {
                    if item_count(conn, &id, &item)? < -delta {
                        return Ok(None);
                    }
                    remove_items(conn, &id, &item, -delta)?;
                }
                Ok(Some(item_count(conn, &id, &item)?))
            })
        })
        .await
    }

    async fn take_inventory(&self, user_id: u64, item: &str, up_to: i64) -> Result<i64> {
        let item = item.to_string();
        self.run(move |conn| {
            let id = user_id.to_string();
            transaction(conn, |conn| {
                let taken = item_count(conn, &id, &item)?.min(up_to.max(0));
                if taken > 0 {
                    remove_items(conn, &id, &item, taken)?;
                }
                Ok(taken)
            })
        })
        .await
    }
}

#[async_trait]
impl FarmStore for SqliteStore {
    async fn get_plots(&self, user_id: u64) -> Result<Vec<Plot>> {
        self.run(move |conn| {
            let mut statement =
                conn.prepare("SELECT crop, planted_at FROM plots WHERE user_id = ? ORDER BY slot")?;
            statement.bind((1, user_id.to_string().as_str()))?;
            let mut plots = Vec::new();
            while let State::Row = statement.next()? {
                let crop = statement.read::<String, _>("crop")?;
                plots.push(Plot {
                    crop: (!crop.is_empty()).then_some(crop),
                    planted_at: statement.read::<i64, _>("planted_at")?,
                });
            }
            Ok(plots)
        })
        .await
    }

    async fn add_plots(&self, user_id: u64, count: usize) -> Result<usize> {
        self.run(move |conn| {
            let id = user_id.to_string();
            transaction(conn, |conn| {
                let existing = plot_count(conn, &id)?;
                for slot in existing..existing + count {
                    let mut statement =
                        conn.prepare("INSERT INTO plots (user_id, slot) VALUES (?, ?)")?;
                    statement.bind((1, id.as_str()))?;
                    statement.bind((2, slot as i64))?;
                    statement.next()?;
                }
                Ok(existing + count)
            })
        })
        .await
    }

    async fn plant(&self, user_id: u64, crop: &str, up_to: i64, now: i64) -> Result<usize> {
        let crop = crop.to_string();
        self.run(move |conn| {
            let id = user_id.to_string();
            transaction(conn, |conn| {
                let wanted = item_count(conn, &id, &crop)?.min(up_to.max(0));
                if wanted == 0 {
                    return Ok(0);
                }

                let mut statement = conn.prepare(
                    "SELECT slot FROM plots WHERE user_id = ? AND crop = '' ORDER BY slot LIMIT ?",
                )?;
                statement.bind((1, id.as_str()))?;
                statement.bind((2, wanted))?;
                let mut slots = Vec::new();
                while let State::Row = statement.next()? {
                    slots.push(statement.read::<i64, _>("slot")?);
                }

                for slot in &slots {
                    let mut statement = conn.prepare(
                        "UPDATE plots SET crop = :crop, planted_at = :now WHERE user_id = :id AND slot = :slot",
                    )?;
                    statement.bind((":crop", crop.as_str()))?;
                    statement.bind((":now", now))?;
                    statement.bind((":id", id.as_str()))?;
                    statement.bind((":slot", *slot))?;
                    statement.next()?;
                }
                if !slots.is_empty() {
                    remove_items(conn, &id, &crop, slots.len() as i64)?;
                }
                Ok(slots.len())
            })
        })
        .await
    }

    async fn clear_ripe(&self, user_id: u64, crop: &str, cutoff: i64) -> Result<usize> {
        let crop = crop.to_string();
        self.run(move |conn| {
            let mut statement = conn.prepare(
                "UPDATE plots SET crop = '', planted_at = 0
                 WHERE user_id = :id AND crop = :crop AND planted_at <= :cutoff",
            )?;
            statement.bind((":id", user_id.to_string().as_str()))?;
            statement.bind((":crop", crop.as_str()))?;
            statement.bind((":cutoff", cutoff))?;
            statement.next()?;
            Ok(conn.change_count())
        })
        .await
    }
}
