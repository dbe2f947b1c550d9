use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::a001_appointment::aggregate::normalize_email;

/// Sales channel of an order, derived solely from its tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderChannel {
    /// No tags: placed through the web shop
    Online,
    /// One or more tags: placed in a physical store
    Store,
}

/// Commerce order as synced from the shop platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommerceOrder {
    pub id: String,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Free-text tags in shop order. Blank tags are dropped on load.
    pub tags: Vec<String>,
    pub total_price: f64,
}

impl CommerceOrder {
    pub fn channel(&self) -> OrderChannel {
        if self.tags.is_empty() {
            OrderChannel::Online
        } else {
            OrderChannel::Store
        }
    }

    pub fn is_store_order(&self) -> bool {
        self.channel() == OrderChannel::Store
    }

    /// Normalised customer identity, if the order carries one
    pub fn customer_key(&self) -> Option<String> {
        self.customer_email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
    }
}
