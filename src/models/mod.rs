//! Data models for actors, disclosure events and reports

pub mod actor;
pub mod disclosure;
pub mod report;

pub use actor::{
    Actor, ActorFilter, ActorStats, ActorSummary, ContactCard, MAX_TRUST_SCORE, MIN_TRUST_SCORE,
    Role,
};
pub use disclosure::{DisclosureEvent, DisclosureFilter};
pub use report::{Report, ReportAction, ReportStats, ReportStatus};

use serde::Serialize;

/// One-based page selection for listing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub limit: u32,
}

impl Page {
    /// Upper bound on `limit` for any listing
    pub const MAX_LIMIT: u32 = 200;

    pub fn new(number: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.limit as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit as u64)
    }
}

/// A page of results plus the totals needed to render pagination
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.number,
            total_pages: page.total_pages(total),
        }
    }
}
