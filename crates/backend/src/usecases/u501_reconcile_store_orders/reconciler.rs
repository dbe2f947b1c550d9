use chrono::{DateTime, Duration, Utc};
use contracts::domain::a001_appointment::aggregate::AppointmentVisit;
use contracts::domain::a002_commerce_order::aggregate::CommerceOrder;
use contracts::enums::appointment_category::AppointmentCategory;
use contracts::usecases::u501_reconcile_store_orders::dto::{
    MatchProvenance, ReconciliationMatch, ReconciliationSummary,
};
use std::cmp::Reverse;
use std::collections::HashMap;

use super::tag_classifier;

/// Per-customer visits ordered so that, for any instant, the qualifying
/// visit is the last one at or before it.
///
/// Visits are sorted by datetime ascending and, on equal datetimes, by id
/// descending, so the smallest id wins an exact tie.
pub struct VisitIndex<'a> {
    by_customer: HashMap<&'a str, Vec<&'a AppointmentVisit>>,
}

impl<'a> VisitIndex<'a> {
    pub fn new(visits: &'a [AppointmentVisit]) -> Self {
        let mut by_customer: HashMap<&'a str, Vec<&'a AppointmentVisit>> = HashMap::new();
        for visit in visits {
            by_customer
                .entry(visit.customer_email.as_str())
                .or_default()
                .push(visit);
        }
        for list in by_customer.values_mut() {
            list.sort_by(|a, b| {
                a.scheduled_at
                    .cmp(&b.scheduled_at)
                    .then_with(|| Reverse(&a.id).cmp(&Reverse(&b.id)))
            });
        }
        Self { by_customer }
    }

    /// Most recent visit in `[at - lookback, at]`
    pub fn latest_before(
        &self,
        customer: &str,
        at: DateTime<Utc>,
        lookback: Duration,
    ) -> Option<&'a AppointmentVisit> {
        let list = self.by_customer.get(customer)?;
        let idx = list.partition_point(|v| v.scheduled_at <= at);
        let candidate = *list.get(idx.checked_sub(1)?)?;
        let in_window = at
            .checked_sub_signed(lookback)
            .map_or(true, |earliest| candidate.scheduled_at >= earliest);
        in_window.then_some(candidate)
    }
}

/// Attribute every store order to a category.
///
/// Online orders (no tags) are skipped; each store order yields exactly one
/// match. A visit with an unrecognised category counts as no match.
pub fn reconcile_orders<'o>(
    orders: impl IntoIterator<Item = &'o CommerceOrder>,
    visits: &[AppointmentVisit],
    lookback: Duration,
) -> Vec<ReconciliationMatch> {
    let index = VisitIndex::new(visits);

    orders
        .into_iter()
        .filter(|order| order.is_store_order())
        .map(|order| {
            let matched = order.customer_key().and_then(|customer| {
                index
                    .latest_before(&customer, order.created_at, lookback)
                    .and_then(|visit| visit.category.map(|category| (visit, category)))
            });

            match matched {
                Some((visit, category)) => ReconciliationMatch {
                    order_id: order.id.clone(),
                    order_created_at: order.created_at,
                    order_total: order.total_price,
                    category,
                    provenance: MatchProvenance::MatchedAppointment,
                    matched_appointment_id: Some(visit.id.clone()),
                    matched_appointment_at: Some(visit.scheduled_at),
                    inferred_rule: None,
                },
                None => {
                    let inferred = tag_classifier::classify(&order.tags);
                    ReconciliationMatch {
                        order_id: order.id.clone(),
                        order_created_at: order.created_at,
                        order_total: order.total_price,
                        category: inferred.category,
                        provenance: MatchProvenance::InferredFromTags,
                        matched_appointment_id: None,
                        matched_appointment_at: None,
                        inferred_rule: Some(inferred.rule.to_string()),
                    }
                }
            }
        })
        .collect()
}

/// Fold matches and the online orders of the same period into counts and revenue
pub fn summarize<'o>(
    matches: &[ReconciliationMatch],
    online_orders: impl IntoIterator<Item = &'o CommerceOrder>,
) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary::default();

    for m in matches {
        summary.store_order_count += 1;
        match m.provenance {
            MatchProvenance::MatchedAppointment => summary.matched_count += 1,
            MatchProvenance::InferredFromTags => summary.inferred_count += 1,
        }
        match m.category {
            AppointmentCategory::Measurement => {
                summary.measurement_count += 1;
                summary.measurement_revenue += m.order_total;
            }
            AppointmentCategory::Fitting => {
                summary.fitting_count += 1;
                summary.fitting_revenue += m.order_total;
            }
        }
    }

    for order in online_orders {
        summary.online_order_count += 1;
        summary.online_revenue += order.total_price;
    }

    summary
}
