use contracts::dashboards::d400_appointment_stats::dto::{
    HeatmapSlot, PatternBucket, PatternData, PatternInsights, PeriodMetrics, StoreMetrics,
};
use contracts::domain::a001_appointment::aggregate::Appointment;
use contracts::enums::appointment_category::AppointmentCategory;
use std::collections::{BTreeMap, BTreeSet};

const DAYS_PER_WEEK: usize = 7;
const HOURS_PER_DAY: usize = 24;

/// Disjoint partition of a result set: cancelled / completed measurement /
/// completed fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    measurement: u32,
    fitting: u32,
    cancelled: u32,
}

impl Tally {
    fn add(&mut self, appointment: &Appointment) {
        if appointment.is_cancelled {
            self.cancelled += 1;
        } else if appointment.is_completed(AppointmentCategory::Measurement) {
            self.measurement += 1;
        } else if appointment.is_completed(AppointmentCategory::Fitting) {
            self.fitting += 1;
        }
    }

    fn total(&self) -> u32 {
        self.measurement + self.fitting + self.cancelled
    }

    fn cancellation_rate(&self) -> f64 {
        percentage(self.cancelled, self.total())
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Period totals, cancellation rate, average per observed day and the
/// per-store breakdown of an already filtered result set.
pub fn compute_period_metrics(period_label: &str, appointments: &[Appointment]) -> PeriodMetrics {
    let mut overall = Tally::default();
    let mut by_store: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut days = BTreeSet::new();

    for appointment in appointments {
        overall.add(appointment);
        by_store
            .entry(appointment.store_city.as_str())
            .or_default()
            .add(appointment);
        days.insert(appointment.local_date);
    }

    let total = overall.total();
    let distinct_days = days.len() as u32;
    let avg_per_day = if distinct_days == 0 {
        0.0
    } else {
        total as f64 / distinct_days as f64
    };

    let mut stores: Vec<StoreMetrics> = by_store
        .into_iter()
        .map(|(city, tally)| StoreMetrics {
            store_city: city.to_string(),
            total: tally.total(),
            measurement_count: tally.measurement,
            fitting_count: tally.fitting,
            cancelled_count: tally.cancelled,
            cancellation_rate: tally.cancellation_rate(),
        })
        .collect();
    // stable sort keeps the alphabetical order among equal totals
    stores.sort_by(|a, b| b.total.cmp(&a.total));

    PeriodMetrics {
        period_label: period_label.to_string(),
        total,
        measurement_count: overall.measurement,
        fitting_count: overall.fitting,
        cancelled_count: overall.cancelled,
        cancellation_rate: overall.cancellation_rate(),
        avg_per_day,
        distinct_days,
        stores,
    }
}

fn add_to_bucket(bucket: &mut PatternBucket, appointment: &Appointment) {
    bucket.total += 1;
    if appointment.is_cancelled {
        bucket.cancelled_count += 1;
    } else if appointment.is_completed(AppointmentCategory::Measurement) {
        bucket.measurement_count += 1;
    } else if appointment.is_completed(AppointmentCategory::Fitting) {
        bucket.fitting_count += 1;
    }
}

/// Day-of-week and hour distributions plus the 7x24 heatmap.
///
/// Every appointment is counted in `total`, cancelled or not, so the heatmap
/// shows scheduled activity.
pub fn compute_pattern_data(appointments: &[Appointment]) -> PatternData {
    let mut by_day_of_week = vec![PatternBucket::default(); DAYS_PER_WEEK];
    let mut by_hour = vec![PatternBucket::default(); HOURS_PER_DAY];
    let mut heatmap = vec![vec![PatternBucket::default(); HOURS_PER_DAY]; DAYS_PER_WEEK];

    for appointment in appointments {
        let day = appointment.day_of_week as usize;
        let hour = appointment.hour as usize;
        if day >= DAYS_PER_WEEK || hour >= HOURS_PER_DAY {
            tracing::warn!(
                "Appointment {} has out-of-range time fields ({}, {})",
                appointment.id,
                day,
                hour
            );
            continue;
        }

        add_to_bucket(&mut by_day_of_week[day], appointment);
        add_to_bucket(&mut by_hour[hour], appointment);
        add_to_bucket(&mut heatmap[day][hour], appointment);
    }

    let insights = find_insights(&by_day_of_week, &by_hour, &heatmap);

    PatternData {
        by_day_of_week,
        by_hour,
        heatmap,
        insights,
    }
}

/// Index of the first maximal non-zero total
fn busiest(buckets: &[PatternBucket]) -> Option<(usize, u32)> {
    buckets
        .iter()
        .enumerate()
        .fold(None, |best, (idx, bucket)| match best {
            Some((_, count)) if count >= bucket.total => best,
            _ if bucket.total == 0 => best,
            _ => Some((idx, bucket.total)),
        })
}

fn find_insights(
    by_day_of_week: &[PatternBucket],
    by_hour: &[PatternBucket],
    heatmap: &[Vec<PatternBucket>],
) -> Option<PatternInsights> {
    let (busiest_day_of_week, _) = busiest(by_day_of_week)?;
    let (busiest_hour, _) = busiest(by_hour)?;

    let busiest_slot = heatmap
        .iter()
        .enumerate()
        .filter_map(|(day, row)| busiest(row).map(|(hour, count)| (day, hour, count)))
        .fold(None, |best: Option<(usize, usize, u32)>, current| match best {
            Some(b) if b.2 >= current.2 => Some(b),
            _ => Some(current),
        })
        .map(|(day, hour, count)| HeatmapSlot {
            day_of_week: day as u32,
            hour: hour as u32,
            count,
        })?;

    Some(PatternInsights {
        busiest_day_of_week: busiest_day_of_week as u32,
        busiest_hour: busiest_hour as u32,
        busiest_slot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};
    use AppointmentCategory::{Fitting, Measurement};

    fn local(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, day, hour, 0, 0)
            .unwrap()
    }

    fn appt(
        id: usize,
        when: DateTime<FixedOffset>,
        city: &str,
        category: AppointmentCategory,
        cancelled: bool,
    ) -> Appointment {
        Appointment::from_local_time(
            format!("a{}", id),
            &format!("c{}@x.com", id),
            when,
            city,
            category,
            cancelled,
        )
    }

    /// 50 appointments over 10 days: 30 measurement, 15 fitting, 5 cancelled
    fn scenario() -> Vec<Appointment> {
        (0..50)
            .map(|i| {
                let when = local(3 + (i % 10) as u32, 10 + (i % 8) as u32);
                let city = if i % 5 == 0 { "Sevilla" } else { "Madrid" };
                if i < 30 {
                    appt(i, when, city, Measurement, false)
                } else if i < 45 {
                    appt(i, when, city, Fitting, false)
                } else {
                    appt(i, when, city, Fitting, true)
                }
            })
            .collect()
    }

    #[test]
    fn test_period_metrics_scenario() {
        let metrics = compute_period_metrics("2025-03", &scenario());

        assert_eq!(metrics.period_label, "2025-03");
        assert_eq!(metrics.total, 50);
        assert_eq!(metrics.measurement_count, 30);
        assert_eq!(metrics.fitting_count, 15);
        assert_eq!(metrics.cancelled_count, 5);
        assert_eq!(metrics.cancellation_rate, 10.0);
        assert_eq!(metrics.distinct_days, 10);
        assert_eq!(metrics.avg_per_day, 5.0);
        assert_eq!(
            metrics.total,
            metrics.measurement_count + metrics.fitting_count + metrics.cancelled_count
        );
    }

    #[test]
    fn test_store_breakdown_sorted_by_total() {
        let metrics = compute_period_metrics("2025-03", &scenario());

        assert_eq!(metrics.stores.len(), 2);
        assert_eq!(metrics.stores[0].store_city, "Madrid");
        assert_eq!(metrics.stores[0].total, 40);
        assert_eq!(metrics.stores[1].store_city, "Sevilla");
        assert_eq!(metrics.stores[1].total, 10);
        // cancelled rows are 45..50, of which 45 is in Sevilla
        assert_eq!(metrics.stores[1].cancelled_count, 1);
        assert_eq!(metrics.stores[1].cancellation_rate, 10.0);
        for store in &metrics.stores {
            assert_eq!(
                store.total,
                store.measurement_count + store.fitting_count + store.cancelled_count
            );
        }
    }

    #[test]
    fn test_equal_store_totals_keep_city_order() {
        let appointments = vec![
            appt(1, local(3, 10), "Valencia", Measurement, false),
            appt(2, local(3, 11), "Bilbao", Fitting, false),
        ];
        let metrics = compute_period_metrics("x", &appointments);
        assert_eq!(metrics.stores[0].store_city, "Bilbao");
        assert_eq!(metrics.stores[1].store_city, "Valencia");
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let metrics = compute_period_metrics("2025", &[]);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.cancellation_rate, 0.0);
        assert_eq!(metrics.avg_per_day, 0.0);
        assert!(metrics.stores.is_empty());

        let patterns = compute_pattern_data(&[]);
        assert_eq!(patterns.by_day_of_week.len(), 7);
        assert_eq!(patterns.by_hour.len(), 24);
        assert_eq!(patterns.heatmap.len(), 7);
        assert!(patterns.heatmap.iter().all(|row| row.len() == 24));
        assert_eq!(patterns.heatmap_total(), 0);
        assert_eq!(patterns.insights, None);
    }

    #[test]
    fn test_all_cancelled_rate_is_hundred() {
        let appointments = vec![
            appt(1, local(3, 10), "Madrid", Measurement, true),
            appt(2, local(4, 10), "Madrid", Fitting, true),
        ];
        let metrics = compute_period_metrics("x", &appointments);
        assert_eq!(metrics.cancellation_rate, 100.0);
        assert_eq!(metrics.measurement_count + metrics.fitting_count, 0);
    }

    #[test]
    fn test_heatmap_slot_counts() {
        // 2025-03-04 is a Tuesday
        let mut appointments: Vec<Appointment> = (0..7)
            .map(|i| appt(i, local(4, 14), "Madrid", Measurement, i == 0))
            .collect();
        appointments.push(appt(100, local(4, 15), "Madrid", Fitting, false));
        appointments.push(appt(101, local(5, 14), "Madrid", Fitting, false));

        let patterns = compute_pattern_data(&appointments);

        assert_eq!(patterns.heatmap[2][14].total, 7);
        assert_eq!(patterns.heatmap[2][14].cancelled_count, 1);
        assert_eq!(patterns.heatmap[2][14].measurement_count, 6);
        assert_eq!(patterns.heatmap[2][15].total, 1);
        assert_eq!(patterns.heatmap[3][14].total, 1);
        assert_eq!(patterns.heatmap_total(), appointments.len() as u32);
        assert_eq!(patterns.by_day_of_week[2].total, 8);
        assert_eq!(patterns.by_hour[14].total, 8);

        let insights = patterns.insights.unwrap();
        assert_eq!(insights.busiest_day_of_week, 2);
        assert_eq!(insights.busiest_hour, 14);
        assert_eq!(
            insights.busiest_slot,
            HeatmapSlot {
                day_of_week: 2,
                hour: 14,
                count: 7
            }
        );
    }

    #[test]
    fn test_heatmap_total_matches_input_size() {
        let appointments = scenario();
        let patterns = compute_pattern_data(&appointments);
        assert_eq!(patterns.heatmap_total(), 50);

        let per_day: u32 = patterns.by_day_of_week.iter().map(|b| b.total).sum();
        let per_hour: u32 = patterns.by_hour.iter().map(|b| b.total).sum();
        assert_eq!(per_day, 50);
        assert_eq!(per_hour, 50);
    }

    #[test]
    fn test_insight_ties_pick_lowest_index() {
        let monday = local(3, 9);
        let appointments = vec![
            appt(1, monday, "Madrid", Measurement, false),
            appt(2, monday + Duration::days(1) + Duration::hours(2), "Madrid", Fitting, false),
        ];
        let insights = compute_pattern_data(&appointments).insights.unwrap();
        assert_eq!(insights.busiest_day_of_week, 1);
        assert_eq!(insights.busiest_hour, 9);
        assert_eq!(insights.busiest_slot.day_of_week, 1);
        assert_eq!(insights.busiest_slot.hour, 9);
    }

    #[test]
    fn test_idempotent() {
        let appointments = scenario();
        let run = || serde_json::to_string(&compute_period_metrics("2025-03", &appointments));
        let first = run().unwrap();
        let second = run().unwrap();
        assert_eq!(first, second);
    }
}
