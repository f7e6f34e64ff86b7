//! Master-data records: grains, warehouses, and trading contacts
//!
//! These are read-only from the ledger's perspective; administration
//! happens outside this service and rows are referenced by id only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tradeable grain with its standard bag weight (bharti).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Grain {
    pub id: Uuid,
    pub name: String,
    pub hindi_name: Option<String>,
    /// Kilograms per standard bag, used to convert net weight into
    /// bag count plus loose remainder.
    pub standard_bag_weight_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A storage location holding shared stock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A trading counterparty.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub contact_type: ContactType,
    pub phone: Option<String>,
    pub gst_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role a contact plays in the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contact_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Supplier,
    Buyer,
    Broker,
}

impl ContactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Supplier => "supplier",
            ContactType::Buyer => "buyer",
            ContactType::Broker => "broker",
        }
    }
}
