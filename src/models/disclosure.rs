//! Disclosure audit events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record of one seller-contact disclosure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureEvent {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub viewed_at: DateTime<Utc>,
    /// Network origin of the request
    pub origin: Option<String>,
    /// Client agent string
    pub agent: Option<String>,
}

impl DisclosureEvent {
    pub fn new(
        buyer_id: Uuid,
        seller_id: Uuid,
        origin: Option<String>,
        agent: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            buyer_id,
            seller_id,
            viewed_at: Utc::now(),
            origin,
            agent,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisclosureFilter {
    pub buyer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    /// Only events at or after this instant
    pub since: Option<DateTime<Utc>>,
}

impl DisclosureFilter {
    pub fn matches(&self, event: &DisclosureEvent) -> bool {
        self.buyer_id.map_or(true, |id| event.buyer_id == id)
            && self.seller_id.map_or(true, |id| event.seller_id == id)
            && self.since.map_or(true, |since| event.viewed_at >= since)
    }
}
