//! Route definitions for the Grain Manager API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Ledger transactions
        .nest("/transactions", transaction_routes())
        // Inventory projection
        .route("/inventory", get(handlers::get_inventory))
        // Dispatch reconciliation
        .nest("/dispatch", dispatch_routes())
        // Reports
        .nest("/reports", report_routes())
}

/// Transaction routes: the ledger write path, billing, and settlement
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/bulk-sale", post(handlers::create_bulk_sale))
        .route("/bill/:transaction_id", get(handlers::get_bill))
        .route(
            "/:transaction_id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route("/:transaction_id/payment", post(handlers::apply_payment))
        .route("/:transaction_id/payments", get(handlers::list_payments))
}

/// Dispatch routes
fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/by-group/:sale_group_id",
            get(handlers::get_dispatch_by_group),
        )
        .route("/:dispatch_id", put(handlers::update_dispatch))
}

/// Report routes
fn report_routes() -> Router<AppState> {
    Router::new().route("/transport", get(handlers::get_transport_report))
}
