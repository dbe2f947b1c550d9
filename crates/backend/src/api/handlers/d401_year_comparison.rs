use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use contracts::dashboards::d401_year_comparison::dto::{
    AnnualComparisonQuery, MonthComparisonQuery, YearComparisonResponse,
};

use crate::api::state::AppState;
use crate::shared::error::{AnalyticsError, AnalyticsResult};

/// GET /api/d401/month_comparison?month=1&years=2023,2024,2025&store_city=Madrid
pub async fn get_month_comparison(
    State(state): State<AppState>,
    Query(query): Query<MonthComparisonQuery>,
) -> Result<Json<YearComparisonResponse>, StatusCode> {
    let (month, years) = parse_month_comparison(&query).map_err(|e| {
        tracing::warn!("D401 Dashboard: rejected request: {}", e);
        e.status_code()
    })?;
    let store_city = store_filter(query.store_city);

    tracing::info!(
        "D401 Dashboard: Comparing month {} across {:?} (store: {:?})",
        month,
        years,
        store_city
    );

    let response = state.comparison.compare_month(month, &years, store_city).await;
    tracing::info!(
        "D401 Dashboard: Returning {} of {} requested years",
        response.years.len(),
        years.len()
    );
    Ok(Json(response))
}

/// GET /api/d401/annual_comparison?years=2023,2024
pub async fn get_annual_comparison(
    State(state): State<AppState>,
    Query(query): Query<AnnualComparisonQuery>,
) -> Result<Json<YearComparisonResponse>, StatusCode> {
    let years = parse_years(&query.years).map_err(|e| {
        tracing::warn!("D401 Dashboard: rejected request: {}", e);
        e.status_code()
    })?;
    let store_city = store_filter(query.store_city);

    tracing::info!(
        "D401 Dashboard: Comparing annual totals across {:?} (store: {:?})",
        years,
        store_city
    );

    Ok(Json(state.comparison.compare_annual(&years, store_city).await))
}

fn store_filter(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_month_comparison(query: &MonthComparisonQuery) -> AnalyticsResult<(u32, Vec<i32>)> {
    if !(1..=12).contains(&query.month) {
        return Err(AnalyticsError::InvalidFilter(format!(
            "month must be within 1..=12, got {}",
            query.month
        )));
    }
    Ok((query.month, parse_years(&query.years)?))
}

/// "2023, 2024,2025" -> [2023, 2024, 2025]
pub fn parse_years(raw: &str) -> AnalyticsResult<Vec<i32>> {
    let years = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map_err(|_| AnalyticsError::InvalidFilter(format!("invalid year '{}'", part)))
        })
        .collect::<AnalyticsResult<Vec<_>>>()?;

    if years.is_empty() {
        return Err(AnalyticsError::InvalidFilter(
            "at least one year is required".into(),
        ));
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_years() {
        assert_eq!(parse_years("2023,2024").unwrap(), vec![2023, 2024]);
        assert_eq!(parse_years(" 2025 , ,2023 ").unwrap(), vec![2025, 2023]);

        assert!(matches!(parse_years(""), Err(AnalyticsError::InvalidFilter(_))));
        assert!(matches!(parse_years(" , "), Err(AnalyticsError::InvalidFilter(_))));
        assert!(matches!(
            parse_years("2023,twenty"),
            Err(AnalyticsError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_month_bounds() {
        let query = |month| MonthComparisonQuery {
            month,
            years: "2024".into(),
            store_city: None,
        };
        assert_eq!(parse_month_comparison(&query(12)).unwrap(), (12, vec![2024]));
        assert!(parse_month_comparison(&query(0)).is_err());
        assert!(parse_month_comparison(&query(13)).is_err());
    }
}
