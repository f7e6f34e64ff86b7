//! Ledger transaction model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Side of the ledger a transaction sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Sale,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Sale => "sale",
        }
    }
}

/// Settlement state of a transaction, derived from its amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// The atomic ledger entry: one purchase or sale line against one
/// warehouse. Rows sharing a `sale_group_id` form one logical bill and
/// share an invoice number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_date: DateTime<Utc>,
    pub transaction_type: TransactionType,
    /// Unique within `transaction_type`, assigned from the per-type
    /// invoice sequence.
    pub invoice_number: i64,
    pub grain_id: Uuid,
    pub contact_id: Uuid,
    pub warehouse_id: Uuid,
    /// Quintals (100 kg); always positive, sign is carried by the type.
    pub quantity_quintal: Decimal,
    pub number_of_bags: Decimal,
    pub rate_per_quintal: Decimal,
    /// Gross amount. Sales: qty x rate plus tax. Purchases: qty x rate
    /// minus the labour total withheld from the seller.
    pub total_amount: Decimal,
    pub tax_percentage: Decimal,
    /// Weighted-average purchase cost snapshotted at sale time, kept for
    /// profit reporting; never recomputed retroactively.
    pub cost_price_per_quintal: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    /// Quantity lost in transit, valued at the sale rate on settlement.
    pub shortage_quantity: Decimal,
    /// Monetary deduction (quality claim etc.).
    pub deduction_amount: Decimal,
    pub deduction_note: Option<String>,
    pub labour_cost_per_bag: Decimal,
    pub transport_cost_per_qtl: Decimal,
    /// This line's share of the shipment's aggregate mandi fee. Tracked
    /// separately from `expenses_total`.
    pub mandi_cost: Decimal,
    pub labour_cost_total: Decimal,
    /// Labour plus transport for the line; excludes mandi.
    pub expenses_total: Decimal,
    pub sale_group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Net amount the counterparty owes: gross minus shortage value and
    /// deduction for sales, gross as-is for purchases.
    pub fn net_payable(&self) -> Decimal {
        crate::settlement::net_payable(
            self.transaction_type,
            self.total_amount,
            self.shortage_quantity,
            self.rate_per_quintal,
            self.deduction_amount,
        )
    }

    /// Unsettled balance against the net payable.
    pub fn outstanding(&self) -> Decimal {
        self.net_payable() - self.amount_paid
    }
}
