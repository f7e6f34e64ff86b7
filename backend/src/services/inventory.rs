//! Inventory projector: derived stock positions
//!
//! A pure read-side computation over committed ledger rows; nothing is
//! cached and nothing is stored. The fold itself lives in `shared` so
//! the invariants can be tested without a database.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{project_inventory, InventoryRow, Movement, TransactionType};

use crate::error::AppResult;
use crate::services::registry::MasterRegistry;

/// Inventory projection service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Project current inventory: per-grain totals, weighted-average
    /// purchase price, and per-warehouse balances with bag/loose
    /// breakdown. Reflects only committed transactions.
    pub async fn get_inventory(&self) -> AppResult<Vec<InventoryRow>> {
        let registry = MasterRegistry::new(self.db.clone());
        let grains = registry.grain_map().await?;
        let warehouses = registry.warehouse_map().await?;

        let movements = sqlx::query_as::<_, MovementRow>(
            "SELECT grain_id, warehouse_id, transaction_type, quantity_quintal, rate_per_quintal \
             FROM transactions",
        )
        .fetch_all(&self.db)
        .await?;

        let movements: Vec<Movement> = movements.into_iter().map(Movement::from).collect();

        Ok(project_inventory(&movements, &grains, &warehouses))
    }
}

/// Row shape for the projection scan
#[derive(sqlx::FromRow)]
struct MovementRow {
    grain_id: Uuid,
    warehouse_id: Uuid,
    transaction_type: TransactionType,
    quantity_quintal: Decimal,
    rate_per_quintal: Decimal,
}

impl From<MovementRow> for Movement {
    fn from(row: MovementRow) -> Self {
        Movement {
            grain_id: row.grain_id,
            warehouse_id: row.warehouse_id,
            transaction_type: row.transaction_type,
            quantity_quintal: row.quantity_quintal,
            rate_per_quintal: row.rate_per_quintal,
        }
    }
}
