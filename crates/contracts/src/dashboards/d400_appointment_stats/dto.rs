use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::a001_appointment::aggregate::Appointment;
use crate::enums::appointment_category::AppointmentCategory;

/// Query string of GET /api/d400/appointment_stats.
///
/// Exactly one period form is expected: `start_date`+`end_date`,
/// `year`+`month`, or `year` alone. Validation happens in the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentStatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub store_city: Option<String>,
    pub appointment_type: Option<String>,
    pub include_patterns: Option<bool>,
}

/// Period a stats request is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodSelector {
    /// Inclusive range of store-local dates
    DateRange { start: NaiveDate, end: NaiveDate },
    YearMonth { year: i32, month: u32 },
    Year { year: i32 },
}

impl PeriodSelector {
    /// Label used in responses, e.g. "2025-03", "2025", "2025-03-01..2025-03-15"
    pub fn label(&self) -> String {
        match self {
            PeriodSelector::DateRange { start, end } => format!("{}..{}", start, end),
            PeriodSelector::YearMonth { year, month } => format!("{:04}-{:02}", year, month),
            PeriodSelector::Year { year } => format!("{:04}", year),
        }
    }

    pub fn contains(&self, appointment: &Appointment) -> bool {
        match self {
            PeriodSelector::DateRange { start, end } => {
                appointment.local_date >= *start && appointment.local_date <= *end
            }
            PeriodSelector::YearMonth { year, month } => {
                appointment.year == *year && appointment.month == *month
            }
            PeriodSelector::Year { year } => appointment.year == *year,
        }
    }
}

/// Validated appointment filter consumed by the aggregation core
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub period: PeriodSelector,
    pub store_city: Option<String>,
    pub category: Option<AppointmentCategory>,
}

impl AppointmentFilter {
    pub fn for_period(period: PeriodSelector) -> Self {
        Self {
            period,
            store_city: None,
            category: None,
        }
    }

    pub fn with_store(mut self, store_city: Option<String>) -> Self {
        self.store_city = store_city;
        self
    }

    pub fn with_category(mut self, category: Option<AppointmentCategory>) -> Self {
        self.category = category;
        self
    }

    /// The category filter applies to the stored category whether or not the
    /// appointment was cancelled.
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.period.contains(appointment)
            && self
                .store_city
                .as_ref()
                .map_or(true, |city| &appointment.store_city == city)
            && self
                .category
                .map_or(true, |category| appointment.category == category)
    }
}

/// Aggregate statistics for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub period_label: String,
    /// measurement_count + fitting_count + cancelled_count
    pub total: u32,
    /// Non-cancelled measurements
    pub measurement_count: u32,
    /// Non-cancelled fittings
    pub fitting_count: u32,
    pub cancelled_count: u32,
    /// Percent of `total`, 0 when empty
    pub cancellation_rate: f64,
    /// `total` divided by the number of distinct local dates observed
    pub avg_per_day: f64,
    pub distinct_days: u32,
    /// Sorted by descending total, then by city
    pub stores: Vec<StoreMetrics>,
}

/// Per-store slice of [`PeriodMetrics`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMetrics {
    pub store_city: String,
    pub total: u32,
    pub measurement_count: u32,
    pub fitting_count: u32,
    pub cancelled_count: u32,
    pub cancellation_rate: f64,
}

/// Occurrence counts for one day-of-week, hour or (day, hour) slot.
///
/// `total` counts every scheduled appointment, cancelled included; the
/// category counts cover non-cancelled appointments only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternBucket {
    pub total: u32,
    pub measurement_count: u32,
    pub fitting_count: u32,
    pub cancelled_count: u32,
}

/// Day-of-week / hour distributions and the combined heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternData {
    /// 7 buckets, index 0 = Sunday
    pub by_day_of_week: Vec<PatternBucket>,
    /// 24 buckets, index = hour
    pub by_hour: Vec<PatternBucket>,
    /// `heatmap[day_of_week][hour]`, 7 x 24
    pub heatmap: Vec<Vec<PatternBucket>>,
    pub insights: Option<PatternInsights>,
}

impl PatternData {
    /// Sum of all heatmap cell totals
    pub fn heatmap_total(&self) -> u32 {
        self.heatmap
            .iter()
            .flat_map(|row| row.iter())
            .map(|cell| cell.total)
            .sum()
    }
}

/// Peaks of the pattern distributions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInsights {
    pub busiest_day_of_week: u32,
    pub busiest_hour: u32,
    pub busiest_slot: HeatmapSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapSlot {
    pub day_of_week: u32,
    pub hour: u32,
    pub count: u32,
}

/// Response of GET /api/d400/appointment_stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentStatsResponse {
    pub metrics: PeriodMetrics,
    pub patterns: Option<PatternData>,
}
