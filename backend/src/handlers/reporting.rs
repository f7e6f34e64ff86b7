//! HTTP handlers for reports

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::reporting::{ReportingService, TransportReportItem};
use crate::AppState;

/// Transport report over all dispatch records
pub async fn get_transport_report(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TransportReportItem>>> {
    let service = ReportingService::new(state.db);
    let report = service.transport_report().await?;
    Ok(Json(report))
}
