use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::domain::a002_commerce_order::aggregate::CommerceOrder;

use super::repository::OrderRepository;
use crate::shared::error::AnalyticsResult;

/// Order repository over an in-memory snapshot
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Vec<CommerceOrder>,
}

impl InMemoryOrderRepository {
    pub fn new(mut orders: Vec<CommerceOrder>) -> Self {
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Self { orders }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<CommerceOrder>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.created_at >= from && o.created_at < to)
            .cloned()
            .collect())
    }
}
