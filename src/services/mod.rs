//! # Collaborators
//!
//! Narrow interfaces the dispatcher and built-in commands consume: account
//! existence, wallet balances, the log channel relay and command mentions.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Inventory and farm plot stores, conditional wallet spending
//! - 1.0.0: Account, wallet, log and mention collaborators with memory and sqlite stores

pub mod log_relay;
pub mod memory;
pub mod mentions;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use log_relay::LogRelay;
pub use memory::MemoryStore;
pub use mentions::MentionDirectory;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn user_exists(&self, user_id: u64) -> Result<bool>;

    /// Create an account, `false` if one already existed
    async fn create_user(&self, user_id: u64) -> Result<bool>;

    /// Delete an account with its wallet, inventory and farm, `false` if none existed
    async fn delete_user(&self, user_id: u64) -> Result<bool>;
}

/// Columns a caller may ask `get_wallet_fields` for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletField {
    Balance,
    UpdatedAt,
}

/// Partial wallet record, only the requested fields are filled in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletRecord {
    pub balance: Option<i64>,
    /// Epoch milliseconds of the last adjustment
    pub updated_at: Option<i64>,
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn get_wallet_fields(&self, user_id: u64, fields: &[WalletField])
        -> Result<Option<WalletRecord>>;

    /// Atomically add `delta` to the balance.
    ///
    /// Returns `false` when the user has no wallet and `upsert` is off.
    async fn adjust_wallet(&self, user_id: u64, delta: i64, upsert: bool) -> Result<bool>;

    /// Take `amount` out of the wallet only if the balance covers it
    async fn spend_wallet(&self, user_id: u64, amount: i64) -> Result<bool>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Held items as `(item, count)` sorted by item id, never with a zero count
    async fn get_inventory(&self, user_id: u64) -> Result<Vec<(String, i64)>>;

    /// Atomically add `delta` to one item's count.
    ///
    /// Returns the new count, or `None` without changing anything when a
    /// negative delta would take the count below zero.
    async fn adjust_inventory(&self, user_id: u64, item: &str, delta: i64) -> Result<Option<i64>>;

    /// Remove up to `up_to` of an item and return how many were removed
    async fn take_inventory(&self, user_id: u64, item: &str, up_to: i64) -> Result<i64>;
}

/// One farm plot, fallow when `crop` is `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plot {
    pub crop: Option<String>,
    /// Epoch milliseconds, zero on fallow plots
    pub planted_at: i64,
}

#[async_trait]
pub trait FarmStore: Send + Sync {
    /// Plots in slot order
    async fn get_plots(&self, user_id: u64) -> Result<Vec<Plot>>;

    /// Append fallow plots, returns the new plot count
    async fn add_plots(&self, user_id: u64, count: usize) -> Result<usize>;

    /// Move up to `up_to` seeds of `crop` from the inventory into fallow
    /// plots as one step. Returns how many were planted.
    async fn plant(&self, user_id: u64, crop: &str, up_to: i64, now: i64) -> Result<usize>;

    /// Make every plot of `crop` planted at or before `cutoff` fallow again,
    /// returns how many were cleared
    async fn clear_ripe(&self, user_id: u64, crop: &str, cutoff: i64) -> Result<usize>;
}

/// Convenience read of just the balance, zero when there is no wallet
pub async fn balance_of(wallets: &dyn WalletStore, user_id: u64) -> Result<i64> {
    Ok(wallets
        .get_wallet_fields(user_id, &[WalletField::Balance])
        .await?
        .and_then(|r| r.balance)
        .unwrap_or(0))
}

/// A failure report forwarded to the log channel
#[derive(Debug, Clone, PartialEq)]
pub struct LogPayload {
    pub title: String,
    pub description: String,
    pub request_id: Option<Uuid>,
}

impl LogPayload {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }
}

#[async_trait]
pub trait LogSink: Send + Sync {
    /// Best effort, implementations queue or drop rather than fail
    async fn send_log(&self, payload: LogPayload);
}

pub trait CommandMentions: Send + Sync {
    /// Clickable mention for a command path, or a code-formatted fallback
    fn mention(&self, name: &str, group: Option<&str>, sub: Option<&str>) -> String;
}
