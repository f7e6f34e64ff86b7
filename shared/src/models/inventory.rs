//! Inventory projection: derived per-grain, per-warehouse balances
//!
//! A pure read-side fold over committed ledger rows; no stored state.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{kg_from_quintals, split_weight, stock_epsilon};

use super::{Grain, Transaction, TransactionType, Warehouse};

/// The slice of a ledger row the projection needs.
#[derive(Debug, Clone)]
pub struct Movement {
    pub grain_id: Uuid,
    pub warehouse_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity_quintal: Decimal,
    pub rate_per_quintal: Decimal,
}

impl From<&Transaction> for Movement {
    fn from(t: &Transaction) -> Self {
        Self {
            grain_id: t.grain_id,
            warehouse_id: t.warehouse_id,
            transaction_type: t.transaction_type,
            quantity_quintal: t.quantity_quintal,
            rate_per_quintal: t.rate_per_quintal,
        }
    }
}

/// Stock held in one warehouse for a grain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity_quintal: Decimal,
    pub bags: i64,
    pub loose_kg: Decimal,
}

/// Derived inventory position for one grain across all warehouses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRow {
    pub grain_id: Uuid,
    pub grain_name: String,
    pub hindi_name: Option<String>,
    pub total_quantity_quintal: Decimal,
    pub bags: i64,
    pub loose_kg: Decimal,
    /// Weighted-average purchase price per quintal; sales never move it.
    pub average_purchase_price: Decimal,
    pub warehouses: Vec<WarehouseStock>,
}

#[derive(Default)]
struct GrainBucket {
    total_quintal: Decimal,
    purchased_value: Decimal,
    purchased_qty: Decimal,
    warehouses: HashMap<Uuid, Decimal>,
}

/// Fold ledger movements into per-grain, per-warehouse balances.
///
/// Purchases add, sales subtract. The weighted-average purchase price is
/// gross cost to the company, quantity x rate over purchase quantity.
/// Per-warehouse entries with a balance inside the stock epsilon are
/// treated as fully drawn down and omitted.
pub fn project_inventory(
    movements: &[Movement],
    grains: &HashMap<Uuid, Grain>,
    warehouses: &HashMap<Uuid, Warehouse>,
) -> Vec<InventoryRow> {
    let mut buckets: HashMap<Uuid, GrainBucket> = HashMap::new();

    for m in movements {
        let bucket = buckets.entry(m.grain_id).or_default();
        let wh_qty = bucket.warehouses.entry(m.warehouse_id).or_default();

        match m.transaction_type {
            TransactionType::Purchase => {
                bucket.total_quintal += m.quantity_quintal;
                *wh_qty += m.quantity_quintal;
                bucket.purchased_value += m.quantity_quintal * m.rate_per_quintal;
                bucket.purchased_qty += m.quantity_quintal;
            }
            TransactionType::Sale => {
                bucket.total_quintal -= m.quantity_quintal;
                *wh_qty -= m.quantity_quintal;
            }
        }
    }

    let mut rows: Vec<InventoryRow> = buckets
        .into_iter()
        .filter_map(|(grain_id, bucket)| {
            let grain = grains.get(&grain_id)?;

            let average_purchase_price = if bucket.purchased_qty > Decimal::ZERO {
                bucket.purchased_value / bucket.purchased_qty
            } else {
                Decimal::ZERO
            };

            let mut stocks: Vec<WarehouseStock> = bucket
                .warehouses
                .into_iter()
                .filter(|(_, qty)| qty.abs() >= stock_epsilon())
                .filter_map(|(warehouse_id, qty)| {
                    let warehouse = warehouses.get(&warehouse_id)?;
                    let split = split_weight(kg_from_quintals(qty), grain.standard_bag_weight_kg);
                    Some(WarehouseStock {
                        warehouse_id,
                        warehouse_name: warehouse.name.clone(),
                        quantity_quintal: qty,
                        bags: split.bags,
                        loose_kg: split.loose_kg,
                    })
                })
                .collect();
            stocks.sort_by(|a, b| a.warehouse_name.cmp(&b.warehouse_name));

            let total_split = split_weight(
                kg_from_quintals(bucket.total_quintal),
                grain.standard_bag_weight_kg,
            );

            Some(InventoryRow {
                grain_id,
                grain_name: grain.name.clone(),
                hindi_name: grain.hindi_name.clone(),
                total_quantity_quintal: bucket.total_quintal,
                bags: total_split.bags,
                loose_kg: total_split.loose_kg,
                average_purchase_price,
                warehouses: stocks,
            })
        })
        .collect();

    rows.sort_by(|a, b| a.grain_name.cmp(&b.grain_name));
    rows
}

/// Weighted-average purchase price over (quantity, rate) pairs; zero when
/// nothing has been purchased.
pub fn weighted_average_price(purchases: &[(Decimal, Decimal)]) -> Decimal {
    let total_qty: Decimal = purchases.iter().map(|(qty, _)| *qty).sum();
    if total_qty <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let total_value: Decimal = purchases.iter().map(|(qty, rate)| qty * rate).sum();
    total_value / total_qty
}
