//! Admin dashboard counters and user directory

use serde::{Deserialize, Serialize};

use crate::audit::{DisclosureAuditor, DisclosureCounts};
use crate::error::MarketResult;
use crate::models::{ActorFilter, ActorStats, ActorSummary, Page, Paginated, ReportStats, Role};
use crate::store::MarketStore;

/// Default user listing page size
pub const DEFAULT_USER_LIMIT: u32 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub blocked: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub users: ActorStats,
    pub disclosures: DisclosureCounts,
    pub reports: ReportStats,
}

pub async fn dashboard_stats(
    store: &dyn MarketStore,
    auditor: &DisclosureAuditor,
) -> MarketResult<DashboardStats> {
    Ok(DashboardStats {
        users: store.actor_stats().await?,
        disclosures: auditor.counts().await?,
        reports: store.report_stats().await?,
    })
}

/// Registered actors, newest first
pub async fn list_users(
    store: &dyn MarketStore,
    query: &UserQuery,
) -> MarketResult<Paginated<ActorSummary>> {
    let page = Page::new(query.page, query.limit, DEFAULT_USER_LIMIT);
    let filter = ActorFilter {
        role: query.role,
        blocked: query.blocked,
    };
    let (actors, total) = store.list_actors(&filter, page).await?;
    let items = actors.iter().map(|a| a.summary()).collect();
    Ok(Paginated::new(items, total, page))
}
