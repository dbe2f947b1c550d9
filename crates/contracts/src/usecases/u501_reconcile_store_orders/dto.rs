use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::appointment_category::AppointmentCategory;

/// GET /api/u501/store_orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOrdersQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub include_matches: Option<bool>,
}

/// GET /api/u501/history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// How the category of a store order was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchProvenance {
    MatchedAppointment,
    InferredFromTags,
}

/// Category attribution of one store order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationMatch {
    pub order_id: String,
    pub order_created_at: DateTime<Utc>,
    pub order_total: f64,
    pub category: AppointmentCategory,
    pub provenance: MatchProvenance,
    pub matched_appointment_id: Option<String>,
    pub matched_appointment_at: Option<DateTime<Utc>>,
    /// Tag rule that fired, for inferred matches
    pub inferred_rule: Option<String>,
}

/// Counts and revenue for a batch of orders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub store_order_count: u32,
    pub matched_count: u32,
    pub inferred_count: u32,
    pub measurement_count: u32,
    pub fitting_count: u32,
    pub measurement_revenue: f64,
    pub fitting_revenue: f64,
    pub online_order_count: u32,
    pub online_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreOrdersResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub summary: ReconciliationSummary,
    /// Empty unless requested with `include_matches=true`
    pub matches: Vec<ReconciliationMatch>,
}

/// Attribution of one calendar month ("YYYY-MM")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAttribution {
    pub period: String,
    pub summary: ReconciliationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub months: Vec<MonthlyAttribution>,
    pub summary: ReconciliationSummary,
}
