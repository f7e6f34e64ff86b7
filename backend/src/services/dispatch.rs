//! Dispatch reconciler: freight billing for bulk sale groups
//!
//! One DispatchInfo per sale group, kept in sync with the group's
//! transaction rows. Payments and deductions may never exceed the gross
//! freight by more than the settlement epsilon.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use shared::models::DispatchInfo;
use shared::settlement::{check_freight, derive_dispatch_status, SettlementError};
use shared::validation;

use crate::error::{AppError, AppResult};

/// Dispatch service owning freight records
#[derive(Clone)]
pub struct DispatchService {
    db: PgPool,
}

/// Patch for updating a dispatch record: present-and-non-null
/// overwrites, absent leaves unchanged. `total_weight` and
/// `gross_freight` are derived from the group's transactions and are
/// not patchable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDispatchInput {
    pub transporter_name: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub destination: Option<String>,
    pub rate: Option<Decimal>,
    pub advance_paid: Option<Decimal>,
    pub delivery_paid: Option<Decimal>,
    pub shortage_deduction: Option<Decimal>,
    pub other_deduction: Option<Decimal>,
    pub deduction_note: Option<String>,
}

const DISPATCH_COLUMNS: &str = "id, sale_group_id, transporter_name, vehicle_number, \
     driver_name, destination, rate, total_weight, gross_freight, advance_paid, delivery_paid, \
     shortage_deduction, other_deduction, deduction_note, status, created_at";

impl DispatchService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fetch the dispatch record for a sale group.
    pub async fn get_by_sale_group(&self, sale_group_id: Uuid) -> AppResult<DispatchInfo> {
        let dispatch = sqlx::query_as::<_, DispatchInfo>(&format!(
            "SELECT {DISPATCH_COLUMNS} FROM dispatch_info WHERE sale_group_id = $1"
        ))
        .bind(sale_group_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Dispatch".to_string()))?;

        Ok(dispatch)
    }

    /// Fetch a dispatch record by id.
    pub async fn get_dispatch(&self, dispatch_id: Uuid) -> AppResult<DispatchInfo> {
        let dispatch = sqlx::query_as::<_, DispatchInfo>(&format!(
            "SELECT {DISPATCH_COLUMNS} FROM dispatch_info WHERE id = $1"
        ))
        .bind(dispatch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Dispatch".to_string()))?;

        Ok(dispatch)
    }

    /// Apply a partial update to a dispatch record.
    ///
    /// Rejects the whole update when the resulting payments and
    /// deductions would exceed the gross freight; re-derives the stored
    /// status from the merged amounts otherwise.
    pub async fn update_dispatch(
        &self,
        dispatch_id: Uuid,
        input: UpdateDispatchInput,
    ) -> AppResult<DispatchInfo> {
        let existing = self.get_dispatch(dispatch_id).await?;

        let transporter_name = input.transporter_name.or(existing.transporter_name);
        let vehicle_number = input.vehicle_number.or(existing.vehicle_number);
        let driver_name = input.driver_name.or(existing.driver_name);
        let destination = input.destination.or(existing.destination);
        let rate = input.rate.unwrap_or(existing.rate);
        let advance_paid = input.advance_paid.unwrap_or(existing.advance_paid);
        let delivery_paid = input.delivery_paid.unwrap_or(existing.delivery_paid);
        let shortage_deduction = input
            .shortage_deduction
            .unwrap_or(existing.shortage_deduction);
        let other_deduction = input.other_deduction.unwrap_or(existing.other_deduction);
        let deduction_note = input.deduction_note.or(existing.deduction_note);

        validation::validate_non_negative(rate)
            .map_err(|msg| AppError::validation("rate", msg))?;
        validation::validate_non_negative(advance_paid)
            .map_err(|msg| AppError::validation("advance_paid", msg))?;
        validation::validate_non_negative(delivery_paid)
            .map_err(|msg| AppError::validation("delivery_paid", msg))?;
        validation::validate_non_negative(shortage_deduction)
            .map_err(|msg| AppError::validation("shortage_deduction", msg))?;
        validation::validate_non_negative(other_deduction)
            .map_err(|msg| AppError::validation("other_deduction", msg))?;

        let applied = advance_paid + delivery_paid + shortage_deduction + other_deduction;
        if let Err(SettlementError::FreightOverrun {
            gross_freight,
            applied,
        }) = check_freight(existing.gross_freight, applied)
        {
            return Err(AppError::FreightOverrun {
                dispatch_id,
                gross_freight,
                applied,
            });
        }

        let status = derive_dispatch_status(
            existing.gross_freight,
            advance_paid,
            delivery_paid,
            shortage_deduction,
            other_deduction,
        );

        let dispatch = sqlx::query_as::<_, DispatchInfo>(&format!(
            r#"
            UPDATE dispatch_info
            SET transporter_name = $1, vehicle_number = $2, driver_name = $3, destination = $4,
                rate = $5, advance_paid = $6, delivery_paid = $7, shortage_deduction = $8,
                other_deduction = $9, deduction_note = $10, status = $11
            WHERE id = $12
            RETURNING {DISPATCH_COLUMNS}
            "#
        ))
        .bind(&transporter_name)
        .bind(&vehicle_number)
        .bind(&driver_name)
        .bind(&destination)
        .bind(rate)
        .bind(advance_paid)
        .bind(delivery_paid)
        .bind(shortage_deduction)
        .bind(other_deduction)
        .bind(&deduction_note)
        .bind(status)
        .bind(dispatch_id)
        .fetch_one(&self.db)
        .await?;

        Ok(dispatch)
    }

    /// Resynchronize a group's dispatch record after a member
    /// transaction's quantity or transport rate changed.
    ///
    /// Recomputes `total_weight` as the sum of member quantities and
    /// `gross_freight` as the per-line sum of quantity x transport rate,
    /// which stays correct under non-uniform rates. When the edit was a
    /// rate change the dispatch `rate` follows it, last write wins. Runs
    /// inside the caller's SQL transaction.
    pub(crate) async fn sync_sale_group(
        conn: &mut PgConnection,
        sale_group_id: Uuid,
        new_rate: Option<Decimal>,
    ) -> Result<(), sqlx::Error> {
        let (total_weight, gross_freight) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(quantity_quintal), 0),
                   COALESCE(SUM(quantity_quintal * transport_cost_per_qtl), 0)
            FROM transactions
            WHERE sale_group_id = $1
            "#,
        )
        .bind(sale_group_id)
        .fetch_one(&mut *conn)
        .await?;

        let dispatch = sqlx::query_as::<_, (Decimal, Decimal, Decimal, Decimal)>(
            "SELECT advance_paid, delivery_paid, shortage_deduction, other_deduction \
             FROM dispatch_info WHERE sale_group_id = $1",
        )
        .bind(sale_group_id)
        .fetch_optional(&mut *conn)
        .await?;

        // A single sale edited into a group id it never had, or a group
        // whose dispatch is already gone: nothing to sync.
        let Some((advance_paid, delivery_paid, shortage_deduction, other_deduction)) = dispatch
        else {
            return Ok(());
        };

        let status = derive_dispatch_status(
            gross_freight,
            advance_paid,
            delivery_paid,
            shortage_deduction,
            other_deduction,
        );

        sqlx::query(
            "UPDATE dispatch_info \
             SET total_weight = $1, gross_freight = $2, rate = COALESCE($3, rate), status = $4 \
             WHERE sale_group_id = $5",
        )
        .bind(total_weight)
        .bind(gross_freight)
        .bind(new_rate)
        .bind(status)
        .bind(sale_group_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
