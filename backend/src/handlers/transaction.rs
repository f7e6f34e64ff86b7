//! HTTP handlers for ledger transaction endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{PaymentHistory, Transaction};

use crate::error::AppResult;
use crate::services::bulk_sale::{BulkSaleService, CreateBulkSaleInput};
use crate::services::ledger::{CreateTransactionInput, LedgerService, UpdateTransactionInput};
use crate::services::settlement::{ApplyPaymentInput, SettlementService};
use crate::AppState;

/// Listing window, newest first
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create a single purchase or sale transaction
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(input): Json<CreateTransactionInput>,
) -> AppResult<Json<Transaction>> {
    let service = LedgerService::new(state.db);
    let transaction = service.create_transaction(input).await?;
    Ok(Json(transaction))
}

/// Create a bulk sale across multiple warehouses
pub async fn create_bulk_sale(
    State(state): State<AppState>,
    Json(input): Json<CreateBulkSaleInput>,
) -> AppResult<Json<Vec<Transaction>>> {
    let service = BulkSaleService::new(state.db);
    let transactions = service.create_bulk_sale(input).await?;
    Ok(Json(transactions))
}

/// List transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<Transaction>>> {
    let service = LedgerService::new(state.db);
    let transactions = service
        .list_transactions(params.limit.unwrap_or(100), params.offset.unwrap_or(0))
        .await?;
    Ok(Json(transactions))
}

/// Get a single transaction
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<Transaction>> {
    let service = LedgerService::new(state.db);
    let transaction = service.get_transaction(transaction_id).await?;
    Ok(Json(transaction))
}

/// Get the full bill a transaction belongs to
pub async fn get_bill(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<Vec<Transaction>>> {
    let service = LedgerService::new(state.db);
    let bill = service.get_bill(transaction_id).await?;
    Ok(Json(bill))
}

/// Apply a partial update to a transaction
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(input): Json<UpdateTransactionInput>,
) -> AppResult<Json<Transaction>> {
    let service = LedgerService::new(state.db);
    let transaction = service.update_transaction(transaction_id, input).await?;
    Ok(Json(transaction))
}

/// Delete a transaction and its dependent rows
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = LedgerService::new(state.db);
    service.delete_transaction(transaction_id).await?;
    Ok(Json(()))
}

/// Apply a payment against a transaction
pub async fn apply_payment(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    Json(input): Json<ApplyPaymentInput>,
) -> AppResult<Json<Transaction>> {
    let service = SettlementService::new(state.db);
    let transaction = service.apply_payment(transaction_id, input).await?;
    Ok(Json(transaction))
}

/// Payment history for a transaction
pub async fn list_payments(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<Vec<PaymentHistory>>> {
    let service = SettlementService::new(state.db);
    let payments = service.list_payments(transaction_id).await?;
    Ok(Json(payments))
}
