use contracts::dashboards::d400_appointment_stats::dto::{
    AppointmentFilter, AppointmentStatsResponse, PeriodMetrics,
};
use std::sync::Arc;

use super::aggregator;
use crate::domain::a001_appointment::repository::AppointmentRepository;
use crate::shared::cache::QueryCache;
use crate::shared::error::AnalyticsResult;

/// Appointment statistics over the repository, with a best-effort read cache
pub struct AppointmentStatsService {
    repository: Arc<dyn AppointmentRepository>,
    cache: Arc<dyn QueryCache<AppointmentStatsResponse>>,
}

impl AppointmentStatsService {
    pub fn new(
        repository: Arc<dyn AppointmentRepository>,
        cache: Arc<dyn QueryCache<AppointmentStatsResponse>>,
    ) -> Self {
        Self { repository, cache }
    }

    /// Period metrics, plus pattern data when requested
    pub async fn get_stats(
        &self,
        filter: &AppointmentFilter,
        include_patterns: bool,
    ) -> AnalyticsResult<AppointmentStatsResponse> {
        let key = cache_key(filter, include_patterns);

        if let Some(key) = &key {
            if let Some(cached) = self.cache.get(key).await {
                tracing::debug!("D400: cache hit for {}", key);
                return Ok(cached);
            }
        }

        let appointments = self.repository.find_appointments(filter).await?;
        let metrics = aggregator::compute_period_metrics(&filter.period.label(), &appointments);
        let patterns = include_patterns.then(|| aggregator::compute_pattern_data(&appointments));

        let response = AppointmentStatsResponse { metrics, patterns };

        if let Some(key) = key {
            self.cache.set(key, response.clone()).await;
        }

        Ok(response)
    }

    pub async fn get_period_metrics(
        &self,
        filter: &AppointmentFilter,
    ) -> AnalyticsResult<PeriodMetrics> {
        Ok(self.get_stats(filter, false).await?.metrics)
    }

    pub async fn get_available_years(&self) -> AnalyticsResult<Vec<i32>> {
        self.repository.available_years().await
    }
}

fn cache_key(filter: &AppointmentFilter, include_patterns: bool) -> Option<String> {
    match serde_json::to_string(&(filter, include_patterns)) {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::warn!("D400: filter is not cacheable: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_appointment::memory::InMemoryAppointmentRepository;
    use crate::shared::cache::{NoCache, TtlCache};
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};
    use contracts::dashboards::d400_appointment_stats::dto::PeriodSelector;
    use contracts::domain::a001_appointment::aggregate::{Appointment, AppointmentVisit};
    use contracts::enums::appointment_category::AppointmentCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn appointment(id: &str, month: u32, city: &str, category: AppointmentCategory) -> Appointment {
        let local = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, month, 10, 12, 0, 0)
            .unwrap();
        Appointment::from_local_time(id, "a@x.com", local, city, category, false)
    }

    fn repository() -> Arc<InMemoryAppointmentRepository> {
        Arc::new(InMemoryAppointmentRepository::new(vec![
            appointment("a1", 3, "Madrid", AppointmentCategory::Measurement),
            appointment("a2", 3, "Sevilla", AppointmentCategory::Fitting),
            appointment("a3", 4, "Madrid", AppointmentCategory::Fitting),
        ]))
    }

    fn march() -> AppointmentFilter {
        AppointmentFilter::for_period(PeriodSelector::YearMonth {
            year: 2025,
            month: 3,
        })
    }

    struct CountingRepository {
        inner: Arc<InMemoryAppointmentRepository>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AppointmentRepository for CountingRepository {
        async fn find_appointments(
            &self,
            filter: &AppointmentFilter,
        ) -> AnalyticsResult<Vec<Appointment>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_appointments(filter).await
        }

        async fn find_visits_for_customers(
            &self,
            customer_emails: &[String],
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> AnalyticsResult<Vec<AppointmentVisit>> {
            self.inner
                .find_visits_for_customers(customer_emails, from, to)
                .await
        }

        async fn available_years(&self) -> AnalyticsResult<Vec<i32>> {
            self.inner.available_years().await
        }
    }

    #[tokio::test]
    async fn test_stats_with_filters() {
        let service = AppointmentStatsService::new(repository(), Arc::new(NoCache));

        let all = service.get_stats(&march(), false).await.unwrap();
        assert_eq!(all.metrics.period_label, "2025-03");
        assert_eq!(all.metrics.total, 2);
        assert!(all.patterns.is_none());

        let madrid = service
            .get_period_metrics(&march().with_store(Some("Madrid".into())))
            .await
            .unwrap();
        assert_eq!(madrid.total, 1);
        assert_eq!(madrid.measurement_count, 1);

        let fittings = service
            .get_stats(&march().with_category(Some(AppointmentCategory::Fitting)), true)
            .await
            .unwrap();
        assert_eq!(fittings.metrics.fitting_count, 1);
        assert_eq!(fittings.patterns.unwrap().heatmap_total(), 1);
    }

    #[tokio::test]
    async fn test_cache_avoids_recomputation_per_key() {
        let counting = Arc::new(CountingRepository {
            inner: repository(),
            calls: AtomicUsize::new(0),
        });
        let cache: Arc<TtlCache<AppointmentStatsResponse>> =
            Arc::new(TtlCache::new(Duration::from_secs(300), 16));
        let service = AppointmentStatsService::new(counting.clone(), cache);

        let first = service.get_stats(&march(), true).await.unwrap();
        let second = service.get_stats(&march(), true).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        // different flag, different key
        service.get_stats(&march(), false).await.unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_without_cache_always_recomputes() {
        let counting = Arc::new(CountingRepository {
            inner: repository(),
            calls: AtomicUsize::new(0),
        });
        let service = AppointmentStatsService::new(counting.clone(), Arc::new(NoCache));

        service.get_stats(&march(), false).await.unwrap();
        service.get_stats(&march(), false).await.unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_available_years() {
        let service = AppointmentStatsService::new(repository(), Arc::new(NoCache));
        assert_eq!(service.get_available_years().await.unwrap(), vec![2025]);
    }
}
