//! In-memory stock ledger.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ledger::{HealthCheck, StockLedger};
use crate::{Result, WorkerError};

/// In-memory stock ledger for tests and single-process runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockLedger {
    stock: Arc<RwLock<HashMap<i64, i64>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryStockLedger {
    /// Creates an empty ledger. Every product is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger holding the given `(product_id, stock)` pairs.
    pub fn with_stock(entries: impl IntoIterator<Item = (i64, i64)>) -> Self {
        Self {
            stock: Arc::new(RwLock::new(entries.into_iter().collect())),
            offline: Arc::default(),
        }
    }

    /// The catalogue the services ship with: 101 → 10, 102 → 5, 103 → 0.
    pub fn seeded() -> Self {
        Self::with_stock([(101, 10), (102, 5), (103, 0)])
    }

    /// Sets the stock for a product, creating it if needed.
    pub async fn set_stock(&self, product_id: i64, stock: i64) {
        self.stock.write().await.insert(product_id, stock);
    }

    /// Simulates the backing store going away (or coming back).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(WorkerError::Unavailable("ledger offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn on_hand(&self, product_id: i64) -> Result<Option<i64>> {
        self.ensure_online()?;
        Ok(self.stock.read().await.get(&product_id).copied())
    }

    async fn withdraw(&self, product_id: i64, quantity: u32) -> Result<bool> {
        self.ensure_online()?;
        let mut stock = self.stock.write().await;
        match stock.get_mut(&product_id) {
            Some(on_hand) if *on_hand >= i64::from(quantity) => {
                *on_hand -= i64::from(quantity);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl HealthCheck for InMemoryStockLedger {
    async fn check_health(&self) -> Result<()> {
        self.ensure_online()
    }
}
