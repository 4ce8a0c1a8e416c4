//! In-memory account, wallet, inventory and farm store
//!
//! Backs tests and local development. Every change goes through the dashmap
//! entry API so concurrent adjustments to one user never lose an update.
//! Planting holds the user's plots before their inventory, nothing else
//! holds both.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;

use super::{AccountStore, FarmStore, InventoryStore, Plot, WalletField, WalletRecord, WalletStore};

#[derive(Debug, Clone, Copy)]
struct Wallet {
    balance: i64,
    updated_at: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<u64, i64>,
    wallets: DashMap<u64, Wallet>,
    inventories: DashMap<u64, BTreeMap<String, i64>>,
    plots: DashMap<u64, Vec<Plot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn user_exists(&self, user_id: u64) -> Result<bool> {
        Ok(self.accounts.contains_key(&user_id))
    }

    async fn create_user(&self, user_id: u64) -> Result<bool> {
        let now = Utc::now().timestamp_millis();
        Ok(self.accounts.insert(user_id, now).is_none())
    }

    async fn delete_user(&self, user_id: u64) -> Result<bool> {
        self.wallets.remove(&user_id);
        self.inventories.remove(&user_id);
        self.plots.remove(&user_id);
        Ok(self.accounts.remove(&user_id).is_some())
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn get_wallet_fields(
        &self,
        user_id: u64,
        fields: &[WalletField],
    ) -> Result<Option<WalletRecord>> {
        Ok(self.wallets.get(&user_id).map(|w| {
            let mut record = WalletRecord::default();
            for field in fields {
                match field {
                    WalletField::Balance => record.balance = Some(w.balance),
                    WalletField::UpdatedAt => record.updated_at = Some(w.updated_at),
                }
            }
            record
        }))
    }

    async fn adjust_wallet(&self, user_id: u64, delta: i64, upsert: bool) -> Result<bool> {
        let now = Utc::now().timestamp_millis();
        if upsert {
            let mut wallet = self.wallets.entry(user_id).or_insert(Wallet {
                balance: 0,
                updated_at: now,
            });
            wallet.balance += delta;
            wallet.updated_at = now;
            return Ok(true);
        }
        match self.wallets.get_mut(&user_id) {
            Some(mut wallet) => {
                wallet.balance += delta;
                wallet.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn spend_wallet(&self, user_id: u64, amount: i64) -> Result<bool> {
        match self.wallets.get_mut(&user_id) {
            Some(mut wallet) if wallet.balance >= amount => {
                wallet.balance -= amount;
                wallet.updated_at = Utc::now().timestamp_millis();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Remove up to `up_to` of `item`, dropping the entry once it reaches zero
fn take_items(items: &mut BTreeMap<String, i64>, item: &str, up_to: i64) -> i64 {
    let Some(count) = items.get_mut(item) else {
        return 0;
    };
    let taken = (*count).min(up_to.max(0));
    *count -= taken;
    if *count <= 0 {
        items.remove(item);
    }
    taken
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn get_inventory(&self, user_id: u64) -> Result<Vec<(String, i64)>> {
        Ok(self
            .inventories
            .get(&user_id)
            .map(|items| items.iter().map(|(item, count)| (item.clone(), *count)).collect())
            .unwrap_or_default())
    }

    async fn adjust_inventory(&self, user_id: u64, item: &str, delta: i64) -> Result<Option<i64>> {
        let mut items = self.inventories.entry(user_id).or_default();
        let held = items.get(item).copied().unwrap_or(0);
        if held + delta < 0 {
            return Ok(None);
        }
        if held + delta == 0 {
            items.remove(item);
        } else {
            items.insert(item.to_string(), held + delta);
        }
        Ok(Some(held + delta))
    }

    async fn take_inventory(&self, user_id: u64, item: &str, up_to: i64) -> Result<i64> {
        Ok(match self.inventories.get_mut(&user_id) {
            Some(mut items) => take_items(&mut items, item, up_to),
            None => 0,
        })
    }
}

#[async_trait]
impl FarmStore for MemoryStore {
    async fn get_plots(&self, user_id: u64) -> Result<Vec<Plot>> {
        Ok(self.plots.get(&user_id).map(|p| p.value().clone()).unwrap_or_default())
    }

    async fn add_plots(&self, user_id: u64, count: usize) -> Result<usize> {
        let mut plots = self.plots.entry(user_id).or_default();
        plots.extend(std::iter::repeat_with(Plot::default).take(count));
        Ok(plots.len())
    }

    async fn plant(&self, user_id: u64, crop: &str, up_to: i64, now: i64) -> Result<usize> {
        let Some(mut plots) = self.plots.get_mut(&user_id) else {
            return Ok(0);
        };
        let fallow = plots.iter().filter(|p| p.crop.is_none()).count() as i64;
        let planted = match self.inventories.get_mut(&user_id) {
            Some(mut items) => take_items(&mut items, crop, up_to.min(fallow)),
            None => 0,
        };
        for plot in plots.iter_mut().filter(|p| p.crop.is_none()).take(planted as usize) {
            plot.crop = Some(crop.to_string());
            plot.planted_at = now;
        }
        Ok(planted as usize)
    }

    async fn clear_ripe(&self, user_id: u64, crop: &str, cutoff: i64) -> Result<usize> {
        let Some(mut plots) = self.plots.get_mut(&user_id) else {
            return Ok(0);
        };
        let mut cleared = 0;
        for plot in plots.iter_mut() {
            if plot.crop.as_deref() == Some(crop) && plot.planted_at <= cutoff {
                *plot = Plot::default();
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_account_lifecycle() {
        let store = MemoryStore::new();
        assert!(!store.user_exists(7).await.unwrap());
        assert!(store.create_user(7).await.unwrap());
        assert!(!store.create_user(7).await.unwrap());
        assert!(store.user_exists(7).await.unwrap());

        store.adjust_wallet(7, 10, true).await.unwrap();
        assert!(store.delete_user(7).await.unwrap());
        assert!(!store.user_exists(7).await.unwrap());
        assert!(store
            .get_wallet_fields(7, &[WalletField::Balance])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_adjust_without_upsert_requires_wallet() {
        let store = MemoryStore::new();
        assert!(!store.adjust_wallet(1, 100, false).await.unwrap());
        assert!(store.adjust_wallet(1, 100, true).await.unwrap());
        assert!(store.adjust_wallet(1, -30, false).await.unwrap());

        let record = store
            .get_wallet_fields(1, &[WalletField::Balance])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.balance, Some(70));
        assert_eq!(record.updated_at, None);
    }

    #[tokio::test]
    async fn test_concurrent_adjustments_do_not_lose_updates() {
        let store = Arc::new(MemoryStore::new());
        store.adjust_wallet(1, 0, true).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.adjust_wallet(1, 10, false).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let record = store
            .get_wallet_fields(1, &[WalletField::Balance, WalletField::UpdatedAt])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.balance, Some(500));
        assert!(record.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_spend_requires_cover() {
        let store = MemoryStore::new();
        assert!(!store.spend_wallet(4, 10).await.unwrap());
        store.adjust_wallet(4, 500, true).await.unwrap();
        assert!(!store.spend_wallet(4, 501).await.unwrap());
        assert!(store.spend_wallet(4, 500).await.unwrap());
        assert_eq!(
            store
                .get_wallet_fields(4, &[WalletField::Balance])
                .await
                .unwrap()
                .unwrap()
                .balance,
            Some(0)
        );
    }

    #[tokio::test]
    async fn test_inventory_and_planting() {
        let store = MemoryStore::new();
        assert_eq!(store.adjust_inventory(6, "carrot", -1).await.unwrap(), None);
        assert_eq!(store.adjust_inventory(6, "carrot", 4).await.unwrap(), Some(4));
        assert_eq!(store.plant(6, "carrot", 4, 10).await.unwrap(), 0);

        store.add_plots(6, 2).await.unwrap();
        assert_eq!(store.plant(6, "carrot", 4, 10).await.unwrap(), 2);
        assert_eq!(store.get_inventory(6).await.unwrap(), vec![("carrot".to_string(), 2)]);
        assert_eq!(store.clear_ripe(6, "carrot", 9).await.unwrap(), 0);
        assert_eq!(store.clear_ripe(6, "carrot", 10).await.unwrap(), 2);

        assert_eq!(store.take_inventory(6, "carrot", 5).await.unwrap(), 2);
        assert!(store.get_inventory(6).await.unwrap().is_empty());
    }
}
