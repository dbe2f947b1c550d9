use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::domain::a002_commerce_order::aggregate::CommerceOrder;
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder};

use crate::shared::error::AnalyticsResult;

/// Read access to synced shop orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Orders created in `[from, to)`, online and store alike
    async fn find_orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<CommerceOrder>>;
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_commerce_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    /// JSON array of tag strings, as delivered by the shop API
    pub tags_json: String,
    pub total_price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for CommerceOrder {
    type Error = String;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(CommerceOrder {
            tags: parse_tags(&m.tags_json)?,
            id: m.id,
            customer_email: m.customer_email,
            created_at: m.created_at,
            total_price: m.total_price,
        })
    }
}

/// Blank tags carry no information and must not turn an online order into a
/// store order.
fn parse_tags(raw: &str) -> Result<Vec<String>, String> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let tags: Vec<String> =
        serde_json::from_str(raw).map_err(|e| format!("invalid tags_json: {}", e))?;
    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

/// SQLite-backed order repository
#[derive(Clone)]
pub struct SeaOrmOrderRepository {
    db: DatabaseConnection,
}

impl SeaOrmOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for SeaOrmOrderRepository {
    async fn find_orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<CommerceOrder>> {
        let models = Entity::find()
            .filter(Column::CreatedAt.gte(from))
            .filter(Column::CreatedAt.lt(to))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|m| {
                let id = m.id.clone();
                match CommerceOrder::try_from(m) {
                    Ok(order) => Some(order),
                    Err(reason) => {
                        tracing::warn!("Skipping order {}: {}", id, reason);
                        None
                    }
                }
            })
            .collect())
    }
}
