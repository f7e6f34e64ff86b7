//! Transport report: freight settlement position per dispatch
//!
//! Each dispatch record is joined with the first transaction of its sale
//! group for the bill date and invoice number. Orphan dispatch records
//! (group fully deleted mid-flight) are skipped.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{DispatchInfo, DispatchStatus};
use shared::settlement::derive_dispatch_status;

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// One row of the transport report
#[derive(Debug, Serialize)]
pub struct TransportReportItem {
    pub dispatch_id: Uuid,
    pub date: DateTime<Utc>,
    pub invoice_number: i64,
    pub transporter_name: String,
    pub vehicle_number: Option<String>,
    pub destination: Option<String>,
    pub total_weight: Decimal,
    pub rate: Decimal,
    pub gross_freight: Decimal,
    pub advance_paid: Decimal,
    pub delivery_paid: Decimal,
    pub shortage_deduction: Decimal,
    pub other_deduction: Decimal,
    pub total_deduction: Decimal,
    pub balance_pending: Decimal,
    pub status: DispatchStatus,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Transport report over all dispatch records, newest bill first.
    pub async fn transport_report(&self) -> AppResult<Vec<TransportReportItem>> {
        let dispatches = sqlx::query_as::<_, DispatchInfo>(
            "SELECT id, sale_group_id, transporter_name, vehicle_number, driver_name, \
             destination, rate, total_weight, gross_freight, advance_paid, delivery_paid, \
             shortage_deduction, other_deduction, deduction_note, status, created_at \
             FROM dispatch_info",
        )
        .fetch_all(&self.db)
        .await?;

        let mut report = Vec::with_capacity(dispatches.len());

        for dispatch in dispatches {
            // First transaction in the group carries the bill date and
            // invoice number; a dispatch without one is an orphan.
            let bill_head = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
                "SELECT transaction_date, invoice_number FROM transactions \
                 WHERE sale_group_id = $1 ORDER BY created_at LIMIT 1",
            )
            .bind(dispatch.sale_group_id)
            .fetch_optional(&self.db)
            .await?;

            let Some((date, invoice_number)) = bill_head else {
                continue;
            };

            let status = derive_dispatch_status(
                dispatch.gross_freight,
                dispatch.advance_paid,
                dispatch.delivery_paid,
                dispatch.shortage_deduction,
                dispatch.other_deduction,
            );

            report.push(TransportReportItem {
                dispatch_id: dispatch.id,
                date,
                invoice_number,
                transporter_name: dispatch
                    .transporter_name
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                vehicle_number: dispatch.vehicle_number.clone(),
                destination: dispatch.destination.clone(),
                total_weight: dispatch.total_weight,
                rate: dispatch.rate,
                gross_freight: dispatch.gross_freight,
                advance_paid: dispatch.advance_paid,
                delivery_paid: dispatch.delivery_paid,
                shortage_deduction: dispatch.shortage_deduction,
                other_deduction: dispatch.other_deduction,
                total_deduction: dispatch.shortage_deduction + dispatch.other_deduction,
                balance_pending: dispatch.balance_pending(),
                status,
            });
        }

        report.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(report)
    }
}
