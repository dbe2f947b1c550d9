use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use contracts::domain::a002_commerce_order::aggregate::CommerceOrder;
use contracts::usecases::u501_reconcile_store_orders::dto::{
    HistoryResponse, MonthlyAttribution, ReconciliationMatch, StoreOrdersResponse,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::reconciler::{reconcile_orders, summarize};
use crate::domain::a001_appointment::repository::AppointmentRepository;
use crate::domain::a002_commerce_order::repository::OrderRepository;
use crate::shared::config::AnalyticsConfig;
use crate::shared::error::{AnalyticsError, AnalyticsResult};

/// Executor of the store-order reconciliation use case
pub struct ReconcileExecutor {
    appointments: Arc<dyn AppointmentRepository>,
    orders: Arc<dyn OrderRepository>,
    lookback: Duration,
    forward_buffer: Duration,
}

/// Orders of a period plus their candidate visits, reconciled
struct ReconciledBatch {
    store_matches: Vec<ReconciliationMatch>,
    online_orders: Vec<CommerceOrder>,
}

impl ReconcileExecutor {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        orders: Arc<dyn OrderRepository>,
        settings: &AnalyticsConfig,
    ) -> Self {
        Self {
            appointments,
            orders,
            lookback: days_or_max(settings.lookback_days),
            forward_buffer: days_or_max(settings.forward_buffer_days),
        }
    }

    /// Attribute the store orders of `[start_date, end_date]` to appointment categories
    pub async fn reconcile_period(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        include_matches: bool,
    ) -> AnalyticsResult<StoreOrdersResponse> {
        let batch = self.load_and_reconcile(start_date, end_date).await?;
        let summary = summarize(&batch.store_matches, &batch.online_orders);

        tracing::info!(
            "U501: {}..{}: {} store orders ({} matched, {} inferred), {} online",
            start_date,
            end_date,
            summary.store_order_count,
            summary.matched_count,
            summary.inferred_count,
            summary.online_order_count
        );

        Ok(StoreOrdersResponse {
            start_date,
            end_date,
            summary,
            matches: if include_matches {
                batch.store_matches
            } else {
                Vec::new()
            },
        })
    }

    /// Historical classification: one reconciliation pass over the whole
    /// range, reported per calendar month (UTC order dates).
    pub async fn classify_history(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AnalyticsResult<HistoryResponse> {
        let batch = self.load_and_reconcile(start_date, end_date).await?;

        let mut store_by_month: BTreeMap<String, Vec<ReconciliationMatch>> = BTreeMap::new();
        for m in &batch.store_matches {
            store_by_month
                .entry(month_key(m.order_created_at))
                .or_default()
                .push(m.clone());
        }
        let mut online_by_month: BTreeMap<String, Vec<&CommerceOrder>> = BTreeMap::new();
        for order in &batch.online_orders {
            online_by_month
                .entry(month_key(order.created_at))
                .or_default()
                .push(order);
        }

        let months = months_between(start_date, end_date)
            .into_iter()
            .map(|period| {
                let store = store_by_month.get(&period).map(Vec::as_slice).unwrap_or(&[]);
                let online = online_by_month
                    .get(&period)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                MonthlyAttribution {
                    summary: summarize(store, online.iter().copied()),
                    period,
                }
            })
            .collect();

        let summary = summarize(&batch.store_matches, &batch.online_orders);
        tracing::info!(
            "U501 history: {}..{}: {} store orders classified ({} matched, {} inferred)",
            start_date,
            end_date,
            summary.store_order_count,
            summary.matched_count,
            summary.inferred_count
        );

        Ok(HistoryResponse {
            start_date,
            end_date,
            months,
            summary,
        })
    }

    async fn load_and_reconcile(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AnalyticsResult<ReconciledBatch> {
        if start_date > end_date {
            return Err(AnalyticsError::InvalidFilter(format!(
                "start_date {} is after end_date {}",
                start_date, end_date
            )));
        }

        let window = FetchWindow::new(start_date, end_date, self.lookback, self.forward_buffer)
            .ok_or_else(|| {
                AnalyticsError::InvalidFilter(format!(
                    "date range {}..{} is out of range",
                    start_date, end_date
                ))
            })?;
        let (from, to) = (window.orders_from, window.orders_to);

        let orders = self.orders.find_orders(from, to).await?;
        let (store_orders, online_orders): (Vec<_>, Vec<_>) =
            orders.into_iter().partition(CommerceOrder::is_store_order);

        let customers: Vec<String> = store_orders
            .iter()
            .filter_map(CommerceOrder::customer_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let visits = if customers.is_empty() {
            Vec::new()
        } else {
            self.appointments
                .find_visits_for_customers(&customers, window.visits_from, window.visits_to)
                .await?
        };

        tracing::debug!(
            "U501: {} store orders, {} customers, {} candidate visits",
            store_orders.len(),
            customers.len(),
            visits.len()
        );

        Ok(ReconciledBatch {
            store_matches: reconcile_orders(&store_orders, &visits, self.lookback),
            online_orders,
        })
    }
}

/// UTC bounds of one reconciliation pass
struct FetchWindow {
    orders_from: DateTime<Utc>,
    orders_to: DateTime<Utc>,
    visits_from: DateTime<Utc>,
    visits_to: DateTime<Utc>,
}

impl FetchWindow {
    /// `None` when a bound falls outside the representable date range
    fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        lookback: Duration,
        forward_buffer: Duration,
    ) -> Option<Self> {
        let orders_from = start_of_day(start_date);
        let orders_to = start_of_day(end_date).checked_add_signed(Duration::days(1))?;
        Some(Self {
            orders_from,
            orders_to,
            visits_from: orders_from.checked_sub_signed(lookback)?,
            visits_to: orders_to.checked_add_signed(forward_buffer)?,
        })
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn days_or_max(days: i64) -> Duration {
    Duration::try_days(days).unwrap_or_else(Duration::max_value)
}

fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// "YYYY-MM" keys of every month touched by the range, in order
fn months_between(start_date: NaiveDate, end_date: NaiveDate) -> Vec<String> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start_date.year(), start_date.month());
    while (year, month) <= (end_date.year(), end_date.month()) {
        months.push(format!("{:04}-{:02}", year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}
