use axum::{routing::get, Router};

use crate::api::handlers;
use crate::api::state::AppState;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // DASHBOARDS
        // ========================================
        // D400 Appointment statistics
        .route(
            "/api/d400/appointment_stats",
            get(handlers::d400_appointment_stats::get_appointment_stats),
        )
        .route(
            "/api/d400/years",
            get(handlers::d400_appointment_stats::get_available_years),
        )
        // D401 Year-over-year comparison
        .route(
            "/api/d401/month_comparison",
            get(handlers::d401_year_comparison::get_month_comparison),
        )
        .route(
            "/api/d401/annual_comparison",
            get(handlers::d401_year_comparison::get_annual_comparison),
        )
        // ========================================
        // USECASES
        // ========================================
        // U501 Store order reconciliation
        .route(
            "/api/u501/store_orders",
            get(handlers::u501_reconcile_store_orders::get_store_orders),
        )
        .route(
            "/api/u501/history",
            get(handlers::u501_reconcile_store_orders::get_history),
        )
        .with_state(state)
}
