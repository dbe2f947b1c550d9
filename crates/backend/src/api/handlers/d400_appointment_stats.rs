use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use contracts::dashboards::d400_appointment_stats::dto::{
    AppointmentFilter, AppointmentStatsQuery, AppointmentStatsResponse, PeriodSelector,
};
use contracts::enums::appointment_category::AppointmentCategory;

use crate::api::state::AppState;
use crate::shared::error::{AnalyticsError, AnalyticsResult};

/// GET /api/d400/appointment_stats?year=2025&month=3&store_city=Madrid&include_patterns=true
pub async fn get_appointment_stats(
    State(state): State<AppState>,
    Query(query): Query<AppointmentStatsQuery>,
) -> Result<Json<AppointmentStatsResponse>, StatusCode> {
    let include_patterns = query.include_patterns.unwrap_or(false);
    let filter = parse_filter(query).map_err(|e| {
        tracing::warn!("D400 Dashboard: rejected request: {}", e);
        e.status_code()
    })?;

    tracing::info!(
        "D400 Dashboard: Getting appointment stats for {} (store: {:?}, type: {:?})",
        filter.period.label(),
        filter.store_city,
        filter.category
    );

    match state.stats.get_stats(&filter, include_patterns).await {
        Ok(response) => {
            tracing::info!(
                "D400 Dashboard: Returning {} appointments across {} stores",
                response.metrics.total,
                response.metrics.stores.len()
            );
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("D400 Dashboard: Failed to get appointment stats: {}", e);
            Err(e.status_code())
        }
    }
}

/// GET /api/d400/years
pub async fn get_available_years(
    State(state): State<AppState>,
) -> Result<Json<Vec<i32>>, StatusCode> {
    match state.stats.get_available_years().await {
        Ok(years) => {
            tracing::info!("D400 Dashboard: Returning {} available years", years.len());
            Ok(Json(years))
        }
        Err(e) => {
            tracing::error!("D400 Dashboard: Failed to get years: {}", e);
            Err(e.status_code())
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate the query into a filter: exactly one period form, month in
/// 1..=12, ordered range, known appointment type.
pub fn parse_filter(query: AppointmentStatsQuery) -> AnalyticsResult<AppointmentFilter> {
    let invalid = |msg: String| AnalyticsError::InvalidFilter(msg);

    let period = match (query.start_date, query.end_date, query.year, query.month) {
        (Some(start), Some(end), None, None) => {
            if start > end {
                return Err(invalid(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
            PeriodSelector::DateRange { start, end }
        }
        (None, None, Some(year), Some(month)) => {
            if !(1..=12).contains(&month) {
                return Err(invalid(format!("month must be within 1..=12, got {}", month)));
            }
            PeriodSelector::YearMonth { year, month }
        }
        (None, None, Some(year), None) => PeriodSelector::Year { year },
        (Some(_), None, _, _) | (None, Some(_), _, _) => {
            return Err(invalid("start_date and end_date must be given together".into()))
        }
        (None, None, None, Some(_)) => return Err(invalid("month requires year".into())),
        (None, None, None, None) => {
            return Err(invalid(
                "one of start_date/end_date, year/month or year is required".into(),
            ))
        }
        _ => {
            return Err(invalid(
                "a date range cannot be combined with year/month".into(),
            ))
        }
    };

    let category = match non_blank(query.appointment_type) {
        None => None,
        Some(code) => Some(
            AppointmentCategory::from_code(&code)
                .ok_or_else(|| invalid(format!("unknown appointment_type '{}'", code)))?,
        ),
    };

    Ok(AppointmentFilter::for_period(period)
        .with_store(non_blank(query.store_city))
        .with_category(category))
}
