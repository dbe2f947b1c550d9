use serde::{Deserialize, Serialize};

use crate::dashboards::d400_appointment_stats::dto::PeriodMetrics;

/// GET /api/d401/month_comparison?month=1&years=2023,2024,2025
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthComparisonQuery {
    pub month: u32,
    /// Comma-separated list of years
    pub years: String,
    pub store_city: Option<String>,
}

/// GET /api/d401/annual_comparison?years=2023,2024
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualComparisonQuery {
    pub years: String,
    pub store_city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearMetrics {
    pub year: i32,
    pub metrics: PeriodMetrics,
}

/// Change of one year versus the next older year present in the comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverYearDelta {
    pub year: i32,
    pub compared_to: i32,
    pub total_change: i64,
    /// None when the older year has no appointments
    pub total_change_percent: Option<f64>,
    /// Difference in percentage points
    pub cancellation_rate_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearComparisonResponse {
    /// None for whole-year comparisons
    pub month: Option<u32>,
    pub store_city: Option<String>,
    /// Years that could be loaded, newest first
    pub years: Vec<YearMetrics>,
    pub deltas: Vec<YearOverYearDelta>,
}

impl YearComparisonResponse {
    pub fn metrics_for(&self, year: i32) -> Option<&PeriodMetrics> {
        self.years
            .iter()
            .find(|entry| entry.year == year)
            .map(|entry| &entry.metrics)
    }
}
