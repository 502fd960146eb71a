//! In-memory store, used when PostgreSQL is disabled and in tests

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ActorStore, DisclosureStore, ReportStore, StoreResult};
use crate::models::{
    Actor, ActorFilter, ActorStats, DisclosureEvent, DisclosureFilter, Page, Report,
    ReportStats, ReportStatus, Role,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    actors: RwLock<HashMap<Uuid, Actor>>,
    disclosures: RwLock<Vec<DisclosureEvent>>,
    reports: RwLock<HashMap<Uuid, Report>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(items: &[T], page: Page) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl ActorStore for MemoryStore {
    async fn insert_actor(&self, actor: &Actor) -> StoreResult<()> {
        self.actors.write().await.insert(actor.id, actor.clone());
        Ok(())
    }

    async fn get_actor(&self, id: Uuid) -> StoreResult<Option<Actor>> {
        Ok(self.actors.read().await.get(&id).cloned())
    }

    async fn compare_and_swap(&self, actor: &Actor, expected_version: i64) -> StoreResult<bool> {
        let mut actors = self.actors.write().await;
        match actors.get_mut(&actor.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = actor.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_actors(
        &self,
        filter: &ActorFilter,
        page: Page,
    ) -> StoreResult<(Vec<Actor>, u64)> {
        let actors = self.actors.read().await;
        let mut matching: Vec<Actor> = actors.values().filter(|a| filter.matches(a)).cloned().collect();
        matching.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        let total = matching.len() as u64;
        Ok((paginate(&matching, page), total))
    }

    async fn actor_stats(&self) -> StoreResult<ActorStats> {
        let actors = self.actors.read().await;
        let mut stats = ActorStats::default();
        for actor in actors.values() {
            stats.total += 1;
            match actor.role {
                Role::Seller => stats.sellers += 1,
                Role::Buyer => stats.buyers += 1,
                Role::Administrator => {}
            }
            if actor.is_blocked {
                stats.blocked += 1;
            }
            if actor.has_unverified_email() {
                stats.unverified += 1;
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl DisclosureStore for MemoryStore {
    async fn append_disclosure(&self, event: &DisclosureEvent) -> StoreResult<()> {
        self.disclosures.write().await.push(event.clone());
        Ok(())
    }

    async fn query_disclosures(
        &self,
        filter: &DisclosureFilter,
        page: Option<Page>,
    ) -> StoreResult<(Vec<DisclosureEvent>, u64)> {
        let events = self.disclosures.read().await;
        let mut matching: Vec<DisclosureEvent> =
            events.iter().filter(|e| filter.matches(e)).cloned().collect();
        matching.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));
        let total = matching.len() as u64;
        let items = match page {
            Some(page) => paginate(&matching, page),
            None => matching,
        };
        Ok((items, total))
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert_report(&self, report: &Report) -> StoreResult<()> {
        self.reports.write().await.insert(report.id, report.clone());
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<Report>> {
        Ok(self.reports.read().await.get(&id).cloned())
    }

    async fn reports_by_reporter(&self, reporter_id: Uuid) -> StoreResult<Vec<Report>> {
        let reports = self.reports.read().await;
        let mut own: Vec<Report> = reports
            .values()
            .filter(|r| r.reporter_id == reporter_id)
            .cloned()
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(own)
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: Page,
    ) -> StoreResult<(Vec<Report>, u64)> {
        let reports = self.reports.read().await;
        let mut matching: Vec<Report> = reports
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        Ok((paginate(&matching, page), total))
    }

    async fn complete_review(&self, report: &Report) -> StoreResult<bool> {
        let mut reports = self.reports.write().await;
        match reports.get_mut(&report.id) {
            Some(stored) if stored.status == ReportStatus::Pending => {
                stored.status = report.status;
                stored.action = report.action;
                stored.reviewed_by = report.reviewed_by;
                stored.reviewed_at = report.reviewed_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reopen_review(&self, report: &Report) -> StoreResult<bool> {
        let mut reports = self.reports.write().await;
        match reports.get_mut(&report.id) {
            Some(stored)
                if stored.status == report.status && stored.reviewed_by == report.reviewed_by =>
            {
                stored.status = ReportStatus::Pending;
                stored.action = None;
                stored.reviewed_by = None;
                stored.reviewed_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn report_stats(&self) -> StoreResult<ReportStats> {
        let reports = self.reports.read().await;
        Ok(ReportStats {
            total: reports.len() as u64,
            pending: reports.values().filter(|r| r.status == ReportStatus::Pending).count() as u64,
            resolved: reports.values().filter(|r| r.status == ReportStatus::Resolved).count() as u64,
        })
    }
}
