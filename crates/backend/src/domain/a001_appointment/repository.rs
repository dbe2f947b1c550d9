use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use contracts::dashboards::d400_appointment_stats::dto::{AppointmentFilter, PeriodSelector};
use contracts::domain::a001_appointment::aggregate::{
    normalize_email, Appointment, AppointmentVisit,
};
use contracts::enums::appointment_category::AppointmentCategory;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{DatabaseConnection, QueryOrder, QuerySelect};

use crate::shared::error::AnalyticsResult;

/// Bound-parameter budget per `IN (...)` query
const CUSTOMER_CHUNK_SIZE: usize = 500;

/// Read access to synced appointments
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Appointments matching the filter, cancelled ones included
    async fn find_appointments(&self, filter: &AppointmentFilter)
        -> AnalyticsResult<Vec<Appointment>>;

    /// Non-cancelled appointments of the given customers scheduled in `[from, to]`
    async fn find_visits_for_customers(
        &self,
        customer_emails: &[String],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<AppointmentVisit>>;

    /// Years with at least one appointment, newest first
    async fn available_years(&self) -> AnalyticsResult<Vec<i32>>;
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_appointment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub store_city: String,
    pub category: String,
    pub is_cancelled: bool,
    pub year: i32,
    pub month: i32,
    pub day_of_week: i32,
    pub hour: i32,
    pub local_date: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Appointment {
    type Error = String;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let category = AppointmentCategory::from_storage(&m.category)
            .ok_or_else(|| format!("unrecognised category '{}'", m.category))?;
        let month = derived_field(m.month, 1, 12, "month")?;
        let day_of_week = derived_field(m.day_of_week, 0, 6, "day_of_week")?;
        let hour = derived_field(m.hour, 0, 23, "hour")?;

        Ok(Appointment {
            id: m.id,
            customer_email: normalize_email(&m.customer_email),
            scheduled_at: m.scheduled_at,
            store_city: m.store_city,
            category,
            is_cancelled: m.is_cancelled,
            year: m.year,
            month,
            day_of_week,
            hour,
            local_date: m.local_date,
        })
    }
}

impl From<Model> for AppointmentVisit {
    fn from(m: Model) -> Self {
        AppointmentVisit {
            category: AppointmentCategory::from_storage(&m.category),
            customer_email: normalize_email(&m.customer_email),
            scheduled_at: m.scheduled_at,
            id: m.id,
        }
    }
}

/// `LOWER(TRIM(customer_email))`, the SQL side of `normalize_email`
fn normalized_email_column() -> SimpleExpr {
    Func::lower(Func::cust(Alias::new("TRIM")).arg(Expr::col(Column::CustomerEmail))).into()
}

fn derived_field(value: i32, min: i32, max: i32, name: &str) -> Result<u32, String> {
    if (min..=max).contains(&value) {
        Ok(value as u32)
    } else {
        Err(format!("{} out of range: {}", name, value))
    }
}

/// Convert rows into appointments, skipping unusable rows
fn into_appointments(models: Vec<Model>) -> Vec<Appointment> {
    models
        .into_iter()
        .filter_map(|m| {
            let id = m.id.clone();
            match Appointment::try_from(m) {
                Ok(appointment) => Some(appointment),
                Err(reason) => {
                    tracing::warn!("Skipping appointment {}: {}", id, reason);
                    None
                }
            }
        })
        .collect()
}

/// SQLite-backed appointment repository
#[derive(Clone)]
pub struct SeaOrmAppointmentRepository {
    db: DatabaseConnection,
}

impl SeaOrmAppointmentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentRepository for SeaOrmAppointmentRepository {
    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> AnalyticsResult<Vec<Appointment>> {
        let mut query = Entity::find();

        query = match filter.period {
            PeriodSelector::DateRange { start, end } => query
                .filter(Column::LocalDate.gte(start))
                .filter(Column::LocalDate.lte(end)),
            PeriodSelector::YearMonth { year, month } => query
                .filter(Column::Year.eq(year))
                .filter(Column::Month.eq(month as i32)),
            PeriodSelector::Year { year } => query.filter(Column::Year.eq(year)),
        };

        if let Some(city) = &filter.store_city {
            query = query.filter(Column::StoreCity.eq(city.as_str()));
        }

        let models = query
            .order_by_asc(Column::ScheduledAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        // Stored category literals vary in accents and case, so the category
        // filter runs after conversion.
        let appointments = into_appointments(models)
            .into_iter()
            .filter(|a| filter.category.map_or(true, |c| a.category == c))
            .collect();

        Ok(appointments)
    }

    async fn find_visits_for_customers(
        &self,
        customer_emails: &[String],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<AppointmentVisit>> {
        let mut visits = Vec::new();

        for chunk in customer_emails.chunks(CUSTOMER_CHUNK_SIZE) {
            let models = Entity::find()
                .filter(
                    Expr::expr(normalized_email_column())
                        .is_in(chunk.iter().map(|email| normalize_email(email))),
                )
                .filter(Column::IsCancelled.eq(false))
                .filter(Column::ScheduledAt.gte(from))
                .filter(Column::ScheduledAt.lte(to))
                .all(&self.db)
                .await?;
            visits.extend(models.into_iter().map(AppointmentVisit::from));
        }

        Ok(visits)
    }

    async fn available_years(&self) -> AnalyticsResult<Vec<i32>> {
        let years = Entity::find()
            .select_only()
            .column(Column::Year)
            .distinct()
            .order_by_desc(Column::Year)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;
        Ok(years)
    }
}
