//! Disclosure Auditor - append-only record of contact disclosures

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use super::export::{ExportRow, export_filename, write_csv};
use crate::error::{MarketError, MarketResult};
use crate::models::{
    Actor, ActorSummary, DisclosureEvent, DisclosureFilter, Page, Paginated,
};
use crate::store::MarketStore;

/// Trailing days covered by a listing when none is given
pub const DEFAULT_LIST_DAYS: u32 = 7;

/// Trailing days covered by an export when none is given
pub const DEFAULT_EXPORT_DAYS: u32 = 30;

/// Default listing page size
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Admin listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisclosureQuery {
    #[serde(alias = "buyerId")]
    pub buyer_id: Option<Uuid>,
    #[serde(alias = "sellerId")]
    pub seller_id: Option<Uuid>,
    /// Trailing window in days; `Some(0)` disables the time filter
    pub days: Option<u32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// A disclosure event with buyer and seller populated
#[derive(Debug, Clone, Serialize)]
pub struct DisclosureView {
    pub id: Uuid,
    pub buyer: Option<ActorSummary>,
    pub seller: Option<ActorSummary>,
    pub viewed_at: DateTime<Utc>,
    pub origin: Option<String>,
    pub agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DisclosureExport {
    pub filename: String,
    pub csv: String,
    pub rows: usize,
}

/// Start of a trailing window of `days`; `0` means unbounded
fn since_days(days: u32, now: DateTime<Utc>) -> MarketResult<Option<DateTime<Utc>>> {
    if days == 0 {
        return Ok(None);
    }
    now.checked_sub_signed(Duration::days(days as i64))
        .map(Some)
        .ok_or_else(|| MarketError::invalid(format!("days is out of range: {}", days)))
}

pub struct DisclosureAuditor {
    store: Arc<dyn MarketStore>,
}

impl DisclosureAuditor {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// Append one event. Called exactly once per successful disclosure and
    /// never retried here; a failed write is returned to the caller.
    pub async fn record(
        &self,
        buyer_id: Uuid,
        seller_id: Uuid,
        origin: Option<String>,
        agent: Option<String>,
    ) -> MarketResult<DisclosureEvent> {
        let event = DisclosureEvent::new(buyer_id, seller_id, origin, agent);

        if let Err(e) = self.store.append_disclosure(&event).await {
            error!(buyer = %buyer_id, seller = %seller_id, "Failed to write disclosure event: {}", e);
            return Err(e.into());
        }

        info!(
            event_id = %event.id,
            buyer = %buyer_id,
            seller = %seller_id,
            "AUDIT: contact disclosed"
        );
        Ok(event)
    }

    pub async fn list(&self, query: &DisclosureQuery) -> MarketResult<Paginated<DisclosureView>> {
        let page = Page::new(query.page, query.limit, DEFAULT_LIST_LIMIT);
        let filter = DisclosureFilter {
            buyer_id: query.buyer_id,
            seller_id: query.seller_id,
            since: since_days(query.days.unwrap_or(DEFAULT_LIST_DAYS), Utc::now())?,
        };

        let (events, total) = self.store.query_disclosures(&filter, Some(page)).await?;
        let actors = self.load_actors(&events).await?;

        let views = events
            .into_iter()
            .map(|e| DisclosureView {
                id: e.id,
                buyer: actors.get(&e.buyer_id).map(Actor::summary),
                seller: actors.get(&e.seller_id).map(Actor::summary),
                viewed_at: e.viewed_at,
                origin: e.origin,
                agent: e.agent,
            })
            .collect();

        Ok(Paginated::new(views, total, page))
    }

    /// Every event in the trailing window, newest first, as CSV
    pub async fn export(&self, days: Option<u32>) -> MarketResult<DisclosureExport> {
        let now = Utc::now();
        let filter = DisclosureFilter {
            since: since_days(days.unwrap_or(DEFAULT_EXPORT_DAYS), now)?,
            ..Default::default()
        };

        let (events, _) = self.store.query_disclosures(&filter, None).await?;
        let actors = self.load_actors(&events).await?;

        let rows: Vec<ExportRow> = events
            .iter()
            .map(|e| ExportRow::from_event(e, actors.get(&e.buyer_id), actors.get(&e.seller_id)))
            .collect();
        let csv = write_csv(&rows)?;

        info!(rows = rows.len(), "Disclosure events exported");
        Ok(DisclosureExport {
            filename: export_filename(now),
            csv,
            rows: rows.len(),
        })
    }

    /// Disclosure counts over all time, the last 24 hours and the last 7 days
    pub async fn counts(&self) -> MarketResult<DisclosureCounts> {
        let now = Utc::now();
        let count = |since: Option<DateTime<Utc>>| {
            let filter = DisclosureFilter {
                since,
                ..Default::default()
            };
            async move {
                let one = Page { number: 1, limit: 1 };
                self.store
                    .query_disclosures(&filter, Some(one))
                    .await
                    .map(|(_, total)| total)
            }
        };

        Ok(DisclosureCounts {
            total: count(None).await?,
            last_24h: count(Some(now - Duration::hours(24))).await?,
            last_7d: count(Some(now - Duration::days(7))).await?,
        })
    }

    async fn load_actors(&self, events: &[DisclosureEvent]) -> MarketResult<HashMap<Uuid, Actor>> {
        let mut actors = HashMap::new();
        for id in events.iter().flat_map(|e| [e.buyer_id, e.seller_id]) {
            if actors.contains_key(&id) {
                continue;
            }
            if let Some(actor) = self.store.get_actor(id).await? {
                actors.insert(id, actor);
            }
        }
        Ok(actors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisclosureCounts {
    pub total: u64,
    pub last_24h: u64,
    pub last_7d: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::{ActorStore, DisclosureStore, MemoryStore};

    async fn setup() -> (DisclosureAuditor, Arc<MemoryStore>, Actor, Actor) {
        let store = Arc::new(MemoryStore::new());
        let buyer = Actor::new("Quinn", Role::Buyer).with_email("q@example.com", true);
        let seller = Actor::new("Rosa", Role::Seller).with_phone("0722");
        store.insert_actor(&buyer).await.unwrap();
        store.insert_actor(&seller).await.unwrap();
        (DisclosureAuditor::new(store.clone()), store, buyer, seller)
    }

    #[tokio::test]
    async fn test_record_appends_one_event() {
        let (auditor, store, buyer, seller) = setup().await;

        let event = auditor
            .record(buyer.id, seller.id, Some("10.0.0.9".into()), Some("curl/8".into()))
            .await
            .unwrap();

        let (events, total) = store
            .query_disclosures(&DisclosureFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(events[0], event);
    }

    #[tokio::test]
    async fn test_list_filters_window_and_populates() {
        let (auditor, store, buyer, seller) = setup().await;

        auditor.record(buyer.id, seller.id, None, None).await.unwrap();
        let mut stale = DisclosureEvent::new(buyer.id, seller.id, None, None);
        stale.viewed_at = Utc::now() - Duration::days(8);
        store.append_disclosure(&stale).await.unwrap();

        let page = auditor.list(&DisclosureQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].buyer.as_ref().unwrap().name, "Quinn");
        assert_eq!(page.items[0].seller.as_ref().unwrap().name, "Rosa");

        let everything = auditor
            .list(&DisclosureQuery { days: Some(0), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(everything.total, 2);

        let by_other_buyer = auditor
            .list(&DisclosureQuery { buyer_id: Some(Uuid::new_v4()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_other_buyer.total, 0);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let (auditor, _, buyer, seller) = setup().await;
        for _ in 0..5 {
            auditor.record(buyer.id, seller.id, None, None).await.unwrap();
        }

        let page = auditor
            .list(&DisclosureQuery { page: Some(2), limit: Some(2), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
    }

    #[tokio::test]
    async fn test_export_rows() {
        let (auditor, _, buyer, seller) = setup().await;
        auditor.record(buyer.id, seller.id, Some("1.2.3.4".into()), None).await.unwrap();

        let export = auditor.export(None).await.unwrap();
        assert_eq!(export.rows, 1);
        assert!(export.filename.starts_with("disclosure-events-"));
        assert!(export.filename.ends_with(".csv"));
        assert!(export.csv.contains("Quinn,q@example.com,,Rosa,,0722,1.2.3.4,"));
    }

    #[tokio::test]
    async fn test_window_beyond_calendar_rejected() {
        let (auditor, _, buyer, seller) = setup().await;
        auditor.record(buyer.id, seller.id, None, None).await.unwrap();

        let result = auditor
            .list(&DisclosureQuery { days: Some(100_000_000), ..Default::default() })
            .await;
        assert!(matches!(result, Err(MarketError::InvalidInput(_))));
        assert!(matches!(
            auditor.export(Some(u32::MAX)).await,
            Err(MarketError::InvalidInput(_))
        ));

        // Large but representable windows still work
        let wide = auditor
            .list(&DisclosureQuery { days: Some(36_500), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(wide.total, 1);
    }

    #[tokio::test]
    async fn test_counts() {
        let (auditor, store, buyer, seller) = setup().await;
        auditor.record(buyer.id, seller.id, None, None).await.unwrap();
        let mut older = DisclosureEvent::new(buyer.id, seller.id, None, None);
        older.viewed_at = Utc::now() - Duration::days(3);
        store.append_disclosure(&older).await.unwrap();

        let counts = auditor.counts().await.unwrap();
        assert_eq!(counts, DisclosureCounts { total: 2, last_24h: 1, last_7d: 2 });
    }
}
