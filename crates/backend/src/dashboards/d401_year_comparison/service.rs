use contracts::dashboards::d400_appointment_stats::dto::{AppointmentFilter, PeriodSelector};
use contracts::dashboards::d401_year_comparison::dto::{
    YearComparisonResponse, YearMetrics, YearOverYearDelta,
};
use std::sync::Arc;

use crate::dashboards::d400_appointment_stats::service::AppointmentStatsService;

/// Side-by-side period metrics across years.
///
/// A year whose data cannot be loaded is logged and left out; it never fails
/// the whole comparison.
pub struct YearComparisonService {
    stats: Arc<AppointmentStatsService>,
}

impl YearComparisonService {
    pub fn new(stats: Arc<AppointmentStatsService>) -> Self {
        Self { stats }
    }

    /// The same calendar month across `years`
    pub async fn compare_month(
        &self,
        month: u32,
        years: &[i32],
        store_city: Option<String>,
    ) -> YearComparisonResponse {
        let entries = self
            .collect_years(years, |year| {
                AppointmentFilter::for_period(PeriodSelector::YearMonth { year, month })
                    .with_store(store_city.clone())
            })
            .await;

        YearComparisonResponse {
            month: Some(month),
            store_city,
            deltas: year_over_year_deltas(&entries),
            years: entries,
        }
    }

    /// Whole-year totals across `years`
    pub async fn compare_annual(
        &self,
        years: &[i32],
        store_city: Option<String>,
    ) -> YearComparisonResponse {
        let entries = self
            .collect_years(years, |year| {
                AppointmentFilter::for_period(PeriodSelector::Year { year })
                    .with_store(store_city.clone())
            })
            .await;

        YearComparisonResponse {
            month: None,
            store_city,
            deltas: year_over_year_deltas(&entries),
            years: entries,
        }
    }

    /// Newest year first; duplicates requested once
    async fn collect_years<F>(&self, years: &[i32], filter_for: F) -> Vec<YearMetrics>
    where
        F: Fn(i32) -> AppointmentFilter,
    {
        let mut requested = years.to_vec();
        requested.sort_unstable_by(|a, b| b.cmp(a));
        requested.dedup();

        let mut entries = Vec::with_capacity(requested.len());
        for year in requested {
            let filter = filter_for(year);
            match self.stats.get_period_metrics(&filter).await {
                Ok(metrics) => entries.push(YearMetrics { year, metrics }),
                Err(e) => {
                    tracing::warn!(
                        "D401: omitting {} from comparison ({}): {}",
                        year,
                        filter.period.label(),
                        e
                    );
                }
            }
        }
        entries
    }
}

/// Each year against the next older year present (`entries` newest first)
pub fn year_over_year_deltas(entries: &[YearMetrics]) -> Vec<YearOverYearDelta> {
    entries
        .windows(2)
        .map(|pair| {
            let (current, previous) = (&pair[0], &pair[1]);
            let total_change = current.metrics.total as i64 - previous.metrics.total as i64;
            let total_change_percent = if previous.metrics.total == 0 {
                None
            } else {
                Some(total_change as f64 / previous.metrics.total as f64 * 100.0)
            };

            YearOverYearDelta {
                year: current.year,
                compared_to: previous.year,
                total_change,
                total_change_percent,
                cancellation_rate_change: current.metrics.cancellation_rate
                    - previous.metrics.cancellation_rate,
            }
        })
        .collect()
}
