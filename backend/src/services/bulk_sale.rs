//! Bulk sale allocator: one sale across multiple warehouses
//!
//! Plans the split with the pure allocation math, validates every
//! warehouse's stock before anything is written, then persists all sale
//! lines plus the dispatch record in a single SQL transaction. The
//! commit is all-or-nothing.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::allocation::{plan_bulk_sale, AllocationError, BagAllocation, SaleTerms};
use shared::models::{Transaction, TransactionType};

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use crate::services::registry::MasterRegistry;

/// Bulk sale service
#[derive(Clone)]
pub struct BulkSaleService {
    db: PgPool,
}

/// Input for creating a bulk sale
#[derive(Debug, Deserialize)]
pub struct CreateBulkSaleInput {
    pub contact_id: Uuid,
    pub grain_id: Uuid,
    pub rate_per_quintal: Decimal,
    /// Net weight of the whole shipment; distributed across warehouses
    /// proportionally to the requested bag counts.
    pub total_weight_kg: Decimal,
    pub allocations: Vec<BagAllocation>,
    pub tax_percentage: Option<Decimal>,
    pub labour_cost_per_bag: Option<Decimal>,
    pub transport_cost_per_qtl: Option<Decimal>,
    /// Freight advance already paid to the transporter.
    pub transport_advance: Option<Decimal>,
    /// Aggregate mandi fee for the shipment.
    pub mandi_cost: Option<Decimal>,
    pub transporter_name: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub destination: Option<String>,
    pub notes: Option<String>,
}

impl BulkSaleService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a bulk sale: one transaction per warehouse sharing an
    /// invoice number and sale group id, plus one dispatch record.
    pub async fn create_bulk_sale(
        &self,
        input: CreateBulkSaleInput,
    ) -> AppResult<Vec<Transaction>> {
        let registry = MasterRegistry::new(self.db.clone());
        registry.get_grain(input.grain_id).await?;
        registry.get_contact(input.contact_id).await?;
        for alloc in &input.allocations {
            registry.get_warehouse(alloc.warehouse_id).await?;
        }

        let transport_advance = input.transport_advance.unwrap_or(Decimal::ZERO);
        if transport_advance < Decimal::ZERO {
            return Err(AppError::validation(
                "transport_advance",
                "Transport advance must not be negative",
            ));
        }

        let terms = SaleTerms {
            rate_per_quintal: input.rate_per_quintal,
            tax_percentage: input.tax_percentage.unwrap_or(Decimal::ZERO),
            labour_cost_per_bag: input.labour_cost_per_bag.unwrap_or(Decimal::from(3)),
            transport_cost_per_qtl: input.transport_cost_per_qtl.unwrap_or(Decimal::ZERO),
            mandi_cost: input.mandi_cost.unwrap_or(Decimal::ZERO),
        };

        let plan = plan_bulk_sale(&input.allocations, input.total_weight_kg, &terms)
            .map_err(allocation_error)?;

        let mut tx = self.db.begin().await?;

        // Validate every allocation before any row is persisted.
        for line in &plan.lines {
            let available =
                LedgerService::available_stock(&mut tx, input.grain_id, line.warehouse_id).await?;
            if line.quantity_quintal > available {
                return Err(AppError::InsufficientStock {
                    warehouse_id: line.warehouse_id,
                    available,
                    requested: line.quantity_quintal,
                });
            }
        }

        // Snapshot of the carry cost for profit reporting; not
        // recomputed retroactively.
        let cost_price_per_quintal =
            LedgerService::average_purchase_cost(&mut tx, input.grain_id).await?;

        let invoice_number =
            LedgerService::next_invoice_number(&mut tx, TransactionType::Sale).await?;
        let sale_group_id = Uuid::new_v4();

        let mut transactions = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let notes = input
                .notes
                .clone()
                .unwrap_or_else(|| format!("Bulk sale: {} bags", line.bags));

            let transaction = sqlx::query_as::<_, Transaction>(
                r#"
                INSERT INTO transactions (
                    transaction_type, invoice_number, grain_id, contact_id, warehouse_id,
                    quantity_quintal, number_of_bags, rate_per_quintal, total_amount,
                    tax_percentage, cost_price_per_quintal, amount_paid, payment_status, notes,
                    labour_cost_per_bag, transport_cost_per_qtl, mandi_cost, labour_cost_total,
                    expenses_total, sale_group_id
                )
                VALUES ('sale', $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, 'pending', $11,
                        $12, $13, $14, $15, $16, $17)
                RETURNING id, transaction_date, transaction_type, invoice_number, grain_id,
                          contact_id, warehouse_id, quantity_quintal, number_of_bags,
                          rate_per_quintal, total_amount, tax_percentage, cost_price_per_quintal,
                          amount_paid, payment_status, notes, shortage_quantity, deduction_amount,
                          deduction_note, labour_cost_per_bag, transport_cost_per_qtl, mandi_cost,
                          labour_cost_total, expenses_total, sale_group_id, created_at
                "#,
            )
            .bind(invoice_number)
            .bind(input.grain_id)
            .bind(input.contact_id)
            .bind(line.warehouse_id)
            .bind(line.quantity_quintal)
            .bind(Decimal::from(line.bags))
            .bind(input.rate_per_quintal)
            .bind(line.total_amount)
            .bind(terms.tax_percentage)
            .bind(cost_price_per_quintal)
            .bind(&notes)
            .bind(terms.labour_cost_per_bag)
            .bind(terms.transport_cost_per_qtl)
            .bind(line.mandi_share)
            .bind(line.labour_cost_total)
            .bind(line.expenses_total)
            .bind(sale_group_id)
            .fetch_one(&mut *tx)
            .await?;

            transactions.push(transaction);
        }

        sqlx::query(
            r#"
            INSERT INTO dispatch_info (
                sale_group_id, transporter_name, vehicle_number, driver_name, destination,
                rate, total_weight, gross_freight, advance_paid, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            "#,
        )
        .bind(sale_group_id)
        .bind(&input.transporter_name)
        .bind(&input.vehicle_number)
        .bind(&input.driver_name)
        .bind(&input.destination)
        .bind(terms.transport_cost_per_qtl)
        .bind(plan.total_quantity_quintal)
        .bind(plan.gross_freight)
        .bind(transport_advance)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            invoice_number,
            %sale_group_id,
            lines = transactions.len(),
            "bulk sale created"
        );

        Ok(transactions)
    }
}

/// Map a pure allocation rejection onto the field that caused it.
fn allocation_error(err: AllocationError) -> AppError {
    let field = match &err {
        AllocationError::EmptyAllocations | AllocationError::NonPositiveBags(_) => "allocations",
        AllocationError::NonPositiveWeight => "total_weight_kg",
        AllocationError::NegativeTerm(field) => field,
    };
    AppError::validation(field, err.to_string())
}
