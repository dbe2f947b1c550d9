use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::appointment_category::AppointmentCategory;

/// Scheduled in-person visit, as synced from the scheduling platform.
///
/// The time fields (`year`, `month`, `day_of_week`, `hour`, `local_date`) are
/// derived once at ingestion from the store-local datetime and are never
/// recomputed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    /// Lowercased, trimmed email
    pub customer_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub store_city: String,
    pub category: AppointmentCategory,
    pub is_cancelled: bool,
    pub year: i32,
    /// 1..=12
    pub month: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u32,
    /// 0..=23
    pub hour: u32,
    pub local_date: NaiveDate,
}

impl Appointment {
    /// Build an appointment from its store-local datetime, deriving the
    /// calendar fields the way the ingestion sync does.
    pub fn from_local_time(
        id: impl Into<String>,
        customer_email: &str,
        local_time: DateTime<FixedOffset>,
        store_city: impl Into<String>,
        category: AppointmentCategory,
        is_cancelled: bool,
    ) -> Self {
        Self {
            id: id.into(),
            customer_email: normalize_email(customer_email),
            scheduled_at: local_time.with_timezone(&Utc),
            store_city: store_city.into(),
            category,
            is_cancelled,
            year: local_time.year(),
            month: local_time.month(),
            day_of_week: local_time.weekday().num_days_from_sunday(),
            hour: local_time.hour(),
            local_date: local_time.date_naive(),
        }
    }

    /// Non-cancelled appointment of the given category
    pub fn is_completed(&self, category: AppointmentCategory) -> bool {
        !self.is_cancelled && self.category == category
    }
}

/// Slim view of a non-cancelled appointment used when matching orders.
///
/// `category` is `None` when the stored value is not one of the recognised
/// literals; the reconciler then falls back to tag inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentVisit {
    pub id: String,
    pub customer_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub category: Option<AppointmentCategory>,
}

/// Customer identity normalisation shared by appointments and orders
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
