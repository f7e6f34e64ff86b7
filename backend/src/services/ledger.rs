//! Ledger store: transaction persistence, invoice numbering, and the
//! update/delete paths that keep dependent rows in sync
//!
//! Every write path runs as one SQL transaction so stock validation,
//! sequence allocation, and dependent-row maintenance are never observed
//! partially.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use shared::allocation::{labour_total, purchase_total, sale_total};
use shared::models::{Transaction, TransactionType};
use shared::settlement::{derive_payment_status, net_payable};
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::services::dispatch::DispatchService;
use crate::services::registry::MasterRegistry;

/// Ledger service owning transaction rows and invoice numbering
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Input for creating a single transaction
#[derive(Debug, Deserialize)]
pub struct CreateTransactionInput {
    pub transaction_date: Option<DateTime<Utc>>,
    pub transaction_type: TransactionType,
    pub grain_id: Uuid,
    pub contact_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity_quintal: Decimal,
    pub number_of_bags: Option<Decimal>,
    pub rate_per_quintal: Decimal,
    /// Gross amount; computed from quantity, rate, and the type's cost
    /// rule when omitted.
    pub total_amount: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub labour_cost_per_bag: Option<Decimal>,
    pub transport_cost_per_qtl: Option<Decimal>,
    pub notes: Option<String>,
    pub shortage_quantity: Option<Decimal>,
    pub deduction_amount: Option<Decimal>,
    pub deduction_note: Option<String>,
}

/// Patch for updating a transaction: present-and-non-null overwrites,
/// absent leaves unchanged. `amount_paid` and `payment_status` are
/// deliberately not patchable; the settlement engine owns them.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionInput {
    pub transaction_date: Option<DateTime<Utc>>,
    pub grain_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub quantity_quintal: Option<Decimal>,
    pub number_of_bags: Option<Decimal>,
    pub rate_per_quintal: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub shortage_quantity: Option<Decimal>,
    pub deduction_amount: Option<Decimal>,
    pub deduction_note: Option<String>,
    pub labour_cost_per_bag: Option<Decimal>,
    pub transport_cost_per_qtl: Option<Decimal>,
    pub mandi_cost: Option<Decimal>,
}

const TRANSACTION_COLUMNS: &str = "id, transaction_date, transaction_type, invoice_number, \
     grain_id, contact_id, warehouse_id, quantity_quintal, number_of_bags, rate_per_quintal, \
     total_amount, tax_percentage, cost_price_per_quintal, amount_paid, payment_status, notes, \
     shortage_quantity, deduction_amount, deduction_note, labour_cost_per_bag, \
     transport_cost_per_qtl, mandi_cost, labour_cost_total, expenses_total, sale_group_id, \
     created_at";

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a single purchase or sale transaction.
    ///
    /// Purchases withhold the labour total from the seller's payout;
    /// sales charge the buyer quantity x rate plus tax and track labour
    /// and transport as internal expenses. Sales also validate available
    /// stock and snapshot the weighted-average purchase cost.
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> AppResult<Transaction> {
        validation::validate_quantity(input.quantity_quintal)
            .map_err(|msg| AppError::validation("quantity_quintal", msg))?;
        validation::validate_rate(input.rate_per_quintal)
            .map_err(|msg| AppError::validation("rate_per_quintal", msg))?;

        let number_of_bags = input.number_of_bags.unwrap_or(Decimal::ZERO);
        let tax_percentage = input.tax_percentage.unwrap_or(Decimal::ZERO);
        let labour_cost_per_bag = input.labour_cost_per_bag.unwrap_or(Decimal::from(3));
        let transport_cost_per_qtl = input.transport_cost_per_qtl.unwrap_or(Decimal::ZERO);
        let shortage_quantity = input.shortage_quantity.unwrap_or(Decimal::ZERO);
        let deduction_amount = input.deduction_amount.unwrap_or(Decimal::ZERO);

        validation::validate_bags(number_of_bags)
            .map_err(|msg| AppError::validation("number_of_bags", msg))?;
        validation::validate_tax_percentage(tax_percentage)
            .map_err(|msg| AppError::validation("tax_percentage", msg))?;
        validation::validate_non_negative(labour_cost_per_bag)
            .map_err(|msg| AppError::validation("labour_cost_per_bag", msg))?;
        validation::validate_non_negative(transport_cost_per_qtl)
            .map_err(|msg| AppError::validation("transport_cost_per_qtl", msg))?;
        validation::validate_non_negative(shortage_quantity)
            .map_err(|msg| AppError::validation("shortage_quantity", msg))?;
        validation::validate_non_negative(deduction_amount)
            .map_err(|msg| AppError::validation("deduction_amount", msg))?;

        let registry = MasterRegistry::new(self.db.clone());
        registry
            .validate_references(input.grain_id, input.contact_id, input.warehouse_id)
            .await?;

        let labour_cost_total = labour_total(number_of_bags, labour_cost_per_bag);
        let (total_amount, expenses_total) = match input.transaction_type {
            TransactionType::Purchase => {
                let total = input
                    .total_amount
                    .filter(|t| *t > Decimal::ZERO)
                    .unwrap_or_else(|| {
                        purchase_total(
                            input.quantity_quintal,
                            input.rate_per_quintal,
                            labour_cost_total,
                        )
                    });
                (total, Decimal::ZERO)
            }
            TransactionType::Sale => {
                let total = input
                    .total_amount
                    .filter(|t| *t > Decimal::ZERO)
                    .unwrap_or_else(|| {
                        sale_total(
                            input.quantity_quintal,
                            input.rate_per_quintal,
                            tax_percentage,
                        )
                    });
                let transport_cost_total = input.quantity_quintal * transport_cost_per_qtl;
                (total, labour_cost_total + transport_cost_total)
            }
        };

        let transaction_date = input.transaction_date.unwrap_or_else(Utc::now);

        let mut tx = self.db.begin().await?;

        // Sales draw on shared stock: validate the balance and snapshot
        // the purchase cost before the row lands.
        let cost_price_per_quintal = match input.transaction_type {
            TransactionType::Sale => {
                let available =
                    Self::available_stock(&mut tx, input.grain_id, input.warehouse_id).await?;
                if input.quantity_quintal > available {
                    return Err(AppError::InsufficientStock {
                        warehouse_id: input.warehouse_id,
                        available,
                        requested: input.quantity_quintal,
                    });
                }
                Self::average_purchase_cost(&mut tx, input.grain_id).await?
            }
            TransactionType::Purchase => Decimal::ZERO,
        };

        let invoice_number = Self::next_invoice_number(&mut tx, input.transaction_type).await?;

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (
                transaction_date, transaction_type, invoice_number, grain_id, contact_id,
                warehouse_id, quantity_quintal, number_of_bags, rate_per_quintal, total_amount,
                tax_percentage, cost_price_per_quintal, amount_paid, payment_status, notes,
                shortage_quantity, deduction_amount, deduction_note, labour_cost_per_bag,
                transport_cost_per_qtl, labour_cost_total, expenses_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, 'pending', $13,
                    $14, $15, $16, $17, $18, $19, $20)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction_date)
        .bind(input.transaction_type)
        .bind(invoice_number)
        .bind(input.grain_id)
        .bind(input.contact_id)
        .bind(input.warehouse_id)
        .bind(input.quantity_quintal)
        .bind(number_of_bags)
        .bind(input.rate_per_quintal)
        .bind(total_amount)
        .bind(tax_percentage)
        .bind(cost_price_per_quintal)
        .bind(&input.notes)
        .bind(shortage_quantity)
        .bind(deduction_amount)
        .bind(&input.deduction_note)
        .bind(labour_cost_per_bag)
        .bind(transport_cost_per_qtl)
        .bind(labour_cost_total)
        .bind(expenses_total)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// Fetch a transaction by id.
    pub async fn get_transaction(&self, transaction_id: Uuid) -> AppResult<Transaction> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        Ok(transaction)
    }

    /// List transactions, newest first.
    pub async fn list_transactions(
        &self,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             ORDER BY transaction_date DESC, created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    /// The full bill a transaction belongs to: every row of its sale
    /// group when grouped, otherwise just the row itself.
    pub async fn get_bill(&self, transaction_id: Uuid) -> AppResult<Vec<Transaction>> {
        let transaction = self.get_transaction(transaction_id).await?;

        match transaction.sale_group_id {
            Some(sale_group_id) => {
                let group = sqlx::query_as::<_, Transaction>(&format!(
                    "SELECT {TRANSACTION_COLUMNS} FROM transactions \
                     WHERE sale_group_id = $1 ORDER BY created_at"
                ))
                .bind(sale_group_id)
                .fetch_all(&self.db)
                .await?;
                Ok(group)
            }
            None => Ok(vec![transaction]),
        }
    }

    /// Apply a partial update.
    ///
    /// Derived fields are recomputed from the merged row: labour and
    /// expense totals, and the payment status against the new net
    /// payable. Editing quantity or transport rate on a grouped row
    /// resyncs the group's dispatch record in the same SQL transaction.
    pub async fn update_transaction(
        &self,
        transaction_id: Uuid,
        input: UpdateTransactionInput,
    ) -> AppResult<Transaction> {
        let existing = self.get_transaction(transaction_id).await?;

        let registry = MasterRegistry::new(self.db.clone());
        if let Some(grain_id) = input.grain_id {
            registry.get_grain(grain_id).await?;
        }
        if let Some(contact_id) = input.contact_id {
            registry.get_contact(contact_id).await?;
        }
        if let Some(warehouse_id) = input.warehouse_id {
            registry.get_warehouse(warehouse_id).await?;
        }

        let transaction_date = input.transaction_date.unwrap_or(existing.transaction_date);
        let grain_id = input.grain_id.unwrap_or(existing.grain_id);
        let contact_id = input.contact_id.unwrap_or(existing.contact_id);
        let warehouse_id = input.warehouse_id.unwrap_or(existing.warehouse_id);
        let quantity_quintal = input.quantity_quintal.unwrap_or(existing.quantity_quintal);
        let number_of_bags = input.number_of_bags.unwrap_or(existing.number_of_bags);
        let rate_per_quintal = input.rate_per_quintal.unwrap_or(existing.rate_per_quintal);
        let total_amount = input.total_amount.unwrap_or(existing.total_amount);
        let tax_percentage = input.tax_percentage.unwrap_or(existing.tax_percentage);
        let notes = input.notes.or(existing.notes);
        let shortage_quantity = input.shortage_quantity.unwrap_or(existing.shortage_quantity);
        let deduction_amount = input.deduction_amount.unwrap_or(existing.deduction_amount);
        let deduction_note = input.deduction_note.or(existing.deduction_note);
        let labour_cost_per_bag = input
            .labour_cost_per_bag
            .unwrap_or(existing.labour_cost_per_bag);
        let transport_cost_per_qtl = input
            .transport_cost_per_qtl
            .unwrap_or(existing.transport_cost_per_qtl);
        let mandi_cost = input.mandi_cost.unwrap_or(existing.mandi_cost);

        validation::validate_quantity(quantity_quintal)
            .map_err(|msg| AppError::validation("quantity_quintal", msg))?;
        validation::validate_rate(rate_per_quintal)
            .map_err(|msg| AppError::validation("rate_per_quintal", msg))?;
        validation::validate_bags(number_of_bags)
            .map_err(|msg| AppError::validation("number_of_bags", msg))?;
        validation::validate_tax_percentage(tax_percentage)
            .map_err(|msg| AppError::validation("tax_percentage", msg))?;
        validation::validate_non_negative(shortage_quantity)
            .map_err(|msg| AppError::validation("shortage_quantity", msg))?;
        validation::validate_non_negative(deduction_amount)
            .map_err(|msg| AppError::validation("deduction_amount", msg))?;
        validation::validate_non_negative(transport_cost_per_qtl)
            .map_err(|msg| AppError::validation("transport_cost_per_qtl", msg))?;
        validation::validate_non_negative(mandi_cost)
            .map_err(|msg| AppError::validation("mandi_cost", msg))?;

        // Derived fields follow the merged inputs; a stale payment
        // status here would be a correctness bug, not cosmetic.
        let labour_cost_total = labour_total(number_of_bags, labour_cost_per_bag);
        let expenses_total = match existing.transaction_type {
            TransactionType::Sale => {
                labour_cost_total + quantity_quintal * transport_cost_per_qtl
            }
            TransactionType::Purchase => Decimal::ZERO,
        };
        let net = net_payable(
            existing.transaction_type,
            total_amount,
            shortage_quantity,
            rate_per_quintal,
            deduction_amount,
        );
        let payment_status = derive_payment_status(existing.amount_paid, net);

        let quantity_changed = quantity_quintal != existing.quantity_quintal;
        let transport_rate_changed = transport_cost_per_qtl != existing.transport_cost_per_qtl;

        let mut tx = self.db.begin().await?;

        // A sale edit that raises the quantity still has to fit the
        // warehouse balance; the row's own draw is excluded from the
        // check when the (grain, warehouse) pair is unchanged.
        if existing.transaction_type == TransactionType::Sale && quantity_changed {
            let own_draw = if grain_id == existing.grain_id
                && warehouse_id == existing.warehouse_id
            {
                existing.quantity_quintal
            } else {
                Decimal::ZERO
            };
            let available =
                Self::available_stock(&mut tx, grain_id, warehouse_id).await? + own_draw;
            if quantity_quintal > available {
                return Err(AppError::InsufficientStock {
                    warehouse_id,
                    available,
                    requested: quantity_quintal,
                });
            }
        }

        let updated = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET transaction_date = $1, grain_id = $2, contact_id = $3, warehouse_id = $4,
                quantity_quintal = $5, number_of_bags = $6, rate_per_quintal = $7,
                total_amount = $8, tax_percentage = $9, notes = $10, shortage_quantity = $11,
                deduction_amount = $12, deduction_note = $13, labour_cost_per_bag = $14,
                transport_cost_per_qtl = $15, mandi_cost = $16, labour_cost_total = $17,
                expenses_total = $18, payment_status = $19
            WHERE id = $20
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(transaction_date)
        .bind(grain_id)
        .bind(contact_id)
        .bind(warehouse_id)
        .bind(quantity_quintal)
        .bind(number_of_bags)
        .bind(rate_per_quintal)
        .bind(total_amount)
        .bind(tax_percentage)
        .bind(&notes)
        .bind(shortage_quantity)
        .bind(deduction_amount)
        .bind(&deduction_note)
        .bind(labour_cost_per_bag)
        .bind(transport_cost_per_qtl)
        .bind(mandi_cost)
        .bind(labour_cost_total)
        .bind(expenses_total)
        .bind(payment_status)
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(sale_group_id) = updated.sale_group_id {
            if quantity_changed || transport_rate_changed {
                DispatchService::sync_sale_group(
                    &mut tx,
                    sale_group_id,
                    transport_rate_changed.then_some(transport_cost_per_qtl),
                )
                .await?;
            }
        }

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a transaction: payment history first, then the row, then
    /// the dispatch record if this was the last member of its group.
    pub async fn delete_transaction(&self, transaction_id: Uuid) -> AppResult<()> {
        let existing = self.get_transaction(transaction_id).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM payment_history WHERE transaction_id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        if let Some(sale_group_id) = existing.sale_group_id {
            let remaining = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM transactions WHERE sale_group_id = $1",
            )
            .bind(sale_group_id)
            .fetch_one(&mut *tx)
            .await?;

            if remaining == 0 {
                sqlx::query("DELETE FROM dispatch_info WHERE sale_group_id = $1")
                    .bind(sale_group_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(())
    }

    /// Available stock for a (grain, warehouse) pair: purchases minus
    /// sales over committed rows. No reservations, no locking; under
    /// concurrent writers this is a best-effort check.
    pub(crate) async fn available_stock(
        conn: &mut PgConnection,
        grain_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN transaction_type = 'purchase' THEN quantity_quintal
                     ELSE -quantity_quintal END), 0)
            FROM transactions
            WHERE grain_id = $1 AND warehouse_id = $2
            "#,
        )
        .bind(grain_id)
        .bind(warehouse_id)
        .fetch_one(conn)
        .await
    }

    /// Weighted-average purchase cost for a grain, gross quantity x rate
    /// over purchased quantity; zero when nothing has been purchased.
    pub(crate) async fn average_purchase_cost(
        conn: &mut PgConnection,
        grain_id: Uuid,
    ) -> Result<Decimal, sqlx::Error> {
        let (total_value, total_qty) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(quantity_quintal * rate_per_quintal), 0),
                   COALESCE(SUM(quantity_quintal), 0)
            FROM transactions
            WHERE transaction_type = 'purchase' AND grain_id = $1
            "#,
        )
        .bind(grain_id)
        .fetch_one(conn)
        .await?;

        if total_qty > Decimal::ZERO {
            Ok(total_value / total_qty)
        } else {
            Ok(Decimal::ZERO)
        }
    }

    /// Allocate the next invoice number for a transaction type. The
    /// sequence row is bumped inside the caller's SQL transaction, so
    /// concurrent writers cannot observe the same value.
    pub(crate) async fn next_invoice_number(
        conn: &mut PgConnection,
        transaction_type: TransactionType,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE invoice_sequences SET last_value = last_value + 1 \
             WHERE transaction_type = $1 RETURNING last_value",
        )
        .bind(transaction_type)
        .fetch_one(conn)
        .await
    }
}
