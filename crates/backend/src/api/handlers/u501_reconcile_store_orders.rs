use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use contracts::usecases::u501_reconcile_store_orders::dto::{
    HistoryQuery, HistoryResponse, StoreOrdersQuery, StoreOrdersResponse,
};

use crate::api::state::AppState;

/// GET /api/u501/store_orders?start_date=2025-03-01&end_date=2025-03-31&include_matches=true
pub async fn get_store_orders(
    State(state): State<AppState>,
    Query(query): Query<StoreOrdersQuery>,
) -> Result<Json<StoreOrdersResponse>, StatusCode> {
    tracing::info!(
        "U501: Reconciling store orders {}..{}",
        query.start_date,
        query.end_date
    );

    match state
        .reconciliation
        .reconcile_period(
            query.start_date,
            query.end_date,
            query.include_matches.unwrap_or(false),
        )
        .await
    {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("U501: Failed to reconcile store orders: {}", e);
            Err(e.status_code())
        }
    }
}

/// GET /api/u501/history?start_date=2024-01-01&end_date=2024-12-31
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, StatusCode> {
    tracing::info!(
        "U501: Classifying order history {}..{}",
        query.start_date,
        query.end_date
    );

    match state
        .reconciliation
        .classify_history(query.start_date, query.end_date)
        .await
    {
        Ok(response) => {
            tracing::info!("U501: Returning {} monthly buckets", response.months.len());
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("U501: Failed to classify order history: {}", e);
            Err(e.status_code())
        }
    }
}
