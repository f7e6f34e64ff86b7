//! Dispatch (freight billing) model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Freight settlement state for a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dispatch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Pending,
    Partial,
    Cleared,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Pending => "pending",
            DispatchStatus::Partial => "partial",
            DispatchStatus::Cleared => "cleared",
        }
    }
}

/// The freight/transport billing record for one sale group. Created with
/// the bulk sale, recalculated when a member transaction's quantity or
/// transport rate changes, deleted with the last member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DispatchInfo {
    pub id: Uuid,
    pub sale_group_id: Uuid,
    pub transporter_name: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub destination: Option<String>,
    /// Freight rate per quintal; assumed uniform for the trip.
    pub rate: Decimal,
    /// Sum of member quantities, in quintals.
    pub total_weight: Decimal,
    /// Total payable before deductions, per-line sum of
    /// quantity x transport rate.
    pub gross_freight: Decimal,
    pub advance_paid: Decimal,
    pub delivery_paid: Decimal,
    pub shortage_deduction: Decimal,
    pub other_deduction: Decimal,
    pub deduction_note: Option<String>,
    pub status: DispatchStatus,
    pub created_at: DateTime<Utc>,
}

impl DispatchInfo {
    /// Payments plus deductions applied so far.
    pub fn applied_total(&self) -> Decimal {
        self.advance_paid + self.delivery_paid + self.shortage_deduction + self.other_deduction
    }

    /// Freight still owed to the transporter.
    pub fn balance_pending(&self) -> Decimal {
        self.gross_freight - self.applied_total()
    }
}
