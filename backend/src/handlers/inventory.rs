//! HTTP handlers for the inventory projection

use axum::{extract::State, Json};

use shared::models::InventoryRow;

use crate::error::AppResult;
use crate::services::inventory::InventoryService;
use crate::AppState;

/// Current inventory across all grains and warehouses
pub async fn get_inventory(State(state): State<AppState>) -> AppResult<Json<Vec<InventoryRow>>> {
    let service = InventoryService::new(state.db);
    let inventory = service.get_inventory().await?;
    Ok(Json(inventory))
}
