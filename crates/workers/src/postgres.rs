//! PostgreSQL-backed stock ledger.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::Result;
use crate::ledger::{HealthCheck, StockLedger};

/// Stock ledger stored in the `inventory` table.
#[derive(Clone)]
pub struct PostgresStockLedger {
    pool: PgPool,
}

impl PostgresStockLedger {
    /// Creates a new ledger on top of an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Inserts or overwrites the stock for a product.
    pub async fn set_stock(&self, product_id: i64, stock: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, stock)
            VALUES ($1, $2)
            ON CONFLICT (product_id) DO UPDATE SET stock = EXCLUDED.stock, updated_at = NOW()
            "#,
        )
        .bind(product_id)
        .bind(stock)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StockLedger for PostgresStockLedger {
    async fn on_hand(&self, product_id: i64) -> Result<Option<i64>> {
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM inventory WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(stock)
    }

    async fn withdraw(&self, product_id: i64, quantity: u32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET stock = stock - $2, updated_at = NOW()
            WHERE product_id = $1 AND stock >= $2
            "#,
        )
        .bind(product_id)
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl HealthCheck for PostgresStockLedger {
    async fn check_health(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
