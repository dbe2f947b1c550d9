// Dashboard handlers (d400-d401)
pub mod d400_appointment_stats;
pub mod d401_year_comparison;

// UseCase handlers
pub mod u501_reconcile_store_orders;
