use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::dashboards::d400_appointment_stats::dto::AppointmentFilter;
use contracts::domain::a001_appointment::aggregate::{Appointment, AppointmentVisit};
use std::collections::HashSet;

use super::repository::AppointmentRepository;
use crate::shared::error::AnalyticsResult;

/// Appointment repository over an in-memory snapshot
#[derive(Debug, Clone, Default)]
pub struct InMemoryAppointmentRepository {
    appointments: Vec<Appointment>,
}

impl InMemoryAppointmentRepository {
    pub fn new(mut appointments: Vec<Appointment>) -> Self {
        appointments.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { appointments }
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> AnalyticsResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn find_visits_for_customers(
        &self,
        customer_emails: &[String],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<AppointmentVisit>> {
        let customers: HashSet<&str> = customer_emails.iter().map(String::as_str).collect();

        Ok(self
            .appointments
            .iter()
            .filter(|a| !a.is_cancelled)
            .filter(|a| customers.contains(a.customer_email.as_str()))
            .filter(|a| a.scheduled_at >= from && a.scheduled_at <= to)
            .map(|a| AppointmentVisit {
                id: a.id.clone(),
                customer_email: a.customer_email.clone(),
                scheduled_at: a.scheduled_at,
                category: Some(a.category),
            })
            .collect())
    }

    async fn available_years(&self) -> AnalyticsResult<Vec<i32>> {
        let mut years: Vec<i32> = self.appointments.iter().map(|a| a.year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }
}
