//! Settlement engine: payment application and history
//!
//! Every accepted payment appends an immutable history row and updates
//! the running balance in one SQL transaction; a failure leaves neither
//! applied. The owning transaction's `amount_paid` therefore always
//! equals the sum of its history amounts.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::{PaymentHistory, Transaction};
use shared::settlement::{check_payment, derive_payment_status, SettlementError};
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;

/// Settlement service
#[derive(Clone)]
pub struct SettlementService {
    db: PgPool,
}

/// Input for applying a payment
#[derive(Debug, Deserialize)]
pub struct ApplyPaymentInput {
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl SettlementService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply a payment against a transaction's net payable.
    ///
    /// Rejects with `Overpayment` when the amount exceeds the
    /// outstanding balance by more than the settlement epsilon; no state
    /// changes on rejection.
    pub async fn apply_payment(
        &self,
        transaction_id: Uuid,
        input: ApplyPaymentInput,
    ) -> AppResult<Transaction> {
        validation::validate_payment_amount(input.amount)
            .map_err(|msg| AppError::validation("amount", msg))?;

        let ledger = LedgerService::new(self.db.clone());
        let transaction = ledger.get_transaction(transaction_id).await?;

        let net_payable = transaction.net_payable();
        if let Err(SettlementError::Overpayment {
            requested,
            outstanding,
        }) = check_payment(input.amount, transaction.amount_paid, net_payable)
        {
            return Err(AppError::Overpayment {
                transaction_id,
                requested,
                outstanding,
            });
        }

        let amount_paid = transaction.amount_paid + input.amount;
        let payment_status = derive_payment_status(amount_paid, net_payable);

        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO payment_history (transaction_id, amount, notes) VALUES ($1, $2, $3)",
        )
        .bind(transaction_id)
        .bind(input.amount)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET amount_paid = $1, payment_status = $2
            WHERE id = $3
            RETURNING id, transaction_date, transaction_type, invoice_number, grain_id,
                      contact_id, warehouse_id, quantity_quintal, number_of_bags,
                      rate_per_quintal, total_amount, tax_percentage, cost_price_per_quintal,
                      amount_paid, payment_status, notes, shortage_quantity, deduction_amount,
                      deduction_note, labour_cost_per_bag, transport_cost_per_qtl, mandi_cost,
                      labour_cost_total, expenses_total, sale_group_id, created_at
            "#,
        )
        .bind(amount_paid)
        .bind(payment_status)
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            %transaction_id,
            amount = %input.amount,
            outstanding = %updated.outstanding(),
            status = updated.payment_status.as_str(),
            "payment applied"
        );

        Ok(updated)
    }

    /// Payment history for a transaction, newest first.
    pub async fn list_payments(&self, transaction_id: Uuid) -> AppResult<Vec<PaymentHistory>> {
        let ledger = LedgerService::new(self.db.clone());
        ledger.get_transaction(transaction_id).await?;

        let payments = sqlx::query_as::<_, PaymentHistory>(
            "SELECT id, transaction_id, amount, paid_at, notes FROM payment_history \
             WHERE transaction_id = $1 ORDER BY paid_at DESC",
        )
        .bind(transaction_id)
        .fetch_all(&self.db)
        .await?;

        Ok(payments)
    }
}
