//! HTTP handlers for dispatch endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::DispatchInfo;

use crate::error::AppResult;
use crate::services::dispatch::{DispatchService, UpdateDispatchInput};
use crate::AppState;

/// Get the dispatch record for a sale group
pub async fn get_dispatch_by_group(
    State(state): State<AppState>,
    Path(sale_group_id): Path<Uuid>,
) -> AppResult<Json<DispatchInfo>> {
    let service = DispatchService::new(state.db);
    let dispatch = service.get_by_sale_group(sale_group_id).await?;
    Ok(Json(dispatch))
}

/// Apply a partial update to a dispatch record
pub async fn update_dispatch(
    State(state): State<AppState>,
    Path(dispatch_id): Path<Uuid>,
    Json(input): Json<UpdateDispatchInput>,
) -> AppResult<Json<DispatchInfo>> {
    let service = DispatchService::new(state.db);
    let dispatch = service.update_dispatch(dispatch_id, input).await?;
    Ok(Json(dispatch))
}
