use contracts::dashboards::d400_appointment_stats::dto::AppointmentStatsResponse;
use std::sync::Arc;
use std::time::Duration;

use crate::dashboards::d400_appointment_stats::service::AppointmentStatsService;
use crate::dashboards::d401_year_comparison::service::YearComparisonService;
use crate::domain::a001_appointment::repository::AppointmentRepository;
use crate::domain::a002_commerce_order::repository::OrderRepository;
use crate::shared::cache::{NoCache, QueryCache, TtlCache};
use crate::shared::config::AnalyticsConfig;
use crate::usecases::u501_reconcile_store_orders::executor::ReconcileExecutor;

/// Services shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<AppointmentStatsService>,
    pub comparison: Arc<YearComparisonService>,
    pub reconciliation: Arc<ReconcileExecutor>,
}

impl AppState {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        orders: Arc<dyn OrderRepository>,
        settings: &AnalyticsConfig,
    ) -> Self {
        let cache: Arc<dyn QueryCache<AppointmentStatsResponse>> = if settings.cache_ttl_secs == 0 {
            tracing::info!("Stats cache disabled");
            Arc::new(NoCache)
        } else {
            Arc::new(TtlCache::new(
                Duration::from_secs(settings.cache_ttl_secs),
                settings.cache_max_entries,
            ))
        };

        let stats = Arc::new(AppointmentStatsService::new(appointments.clone(), cache));
        let comparison = Arc::new(YearComparisonService::new(stats.clone()));
        let reconciliation = Arc::new(ReconcileExecutor::new(appointments, orders, settings));

        Self {
            stats,
            comparison,
            reconciliation,
        }
    }
}
