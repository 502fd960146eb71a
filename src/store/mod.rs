//! Storage abstraction for the three durable collections
//!
//! Actors, disclosure events and reports live behind async traits so the
//! gating and moderation logic runs unchanged against PostgreSQL
//! ([`crate::database::DatabasePool`]) or the in-memory [`MemoryStore`].

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::error::{MarketError, MarketResult};
use crate::models::{
    Actor, ActorFilter, ActorStats, DisclosureEvent, DisclosureFilter, Page, Report,
    ReportStats, ReportStatus,
};

/// Attempts made by [`update_actor`] before giving up on a contended record
pub const MAX_CAS_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn insert_actor(&self, actor: &Actor) -> StoreResult<()>;

    async fn get_actor(&self, id: Uuid) -> StoreResult<Option<Actor>>;

    /// Replace the stored actor with `actor` only if the stored version still
    /// equals `expected_version`. Returns `false` on a version mismatch or a
    /// missing record.
    async fn compare_and_swap(&self, actor: &Actor, expected_version: i64) -> StoreResult<bool>;

    /// Newest registrations first
    async fn list_actors(&self, filter: &ActorFilter, page: Page)
        -> StoreResult<(Vec<Actor>, u64)>;

    async fn actor_stats(&self) -> StoreResult<ActorStats>;
}

#[async_trait]
pub trait DisclosureStore: Send + Sync {
    /// Pure append; events are never updated
    async fn append_disclosure(&self, event: &DisclosureEvent) -> StoreResult<()>;

    /// Newest first. `page = None` returns every matching event.
    async fn query_disclosures(
        &self,
        filter: &DisclosureFilter,
        page: Option<Page>,
    ) -> StoreResult<(Vec<DisclosureEvent>, u64)>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_report(&self, report: &Report) -> StoreResult<()>;

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<Report>>;

    /// Newest first
    async fn reports_by_reporter(&self, reporter_id: Uuid) -> StoreResult<Vec<Report>>;

    /// Newest first; `status = None` lists every report
    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: Page,
    ) -> StoreResult<(Vec<Report>, u64)>;

    /// Persist the review fields of `report`, but only while the stored copy
    /// is still pending. Returns `false` if another review got there first.
    async fn complete_review(&self, report: &Report) -> StoreResult<bool>;

    /// Undo a review committed by [`ReportStore::complete_review`]: back to
    /// pending with the review fields cleared, but only while the stored copy
    /// still carries `report`'s status and reviewer.
    async fn reopen_review(&self, report: &Report) -> StoreResult<bool>;

    async fn report_stats(&self) -> StoreResult<ReportStats>;
}

/// Everything the service needs from storage
pub trait MarketStore: ActorStore + DisclosureStore + ReportStore {}

impl<T: ActorStore + DisclosureStore + ReportStore> MarketStore for T {}

/// Read-modify-write an actor through compare-and-swap.
///
/// `mutate` may run more than once if a concurrent writer wins the race, so it
/// must only depend on the actor it is given. Returns `Ok(None)` when the
/// actor does not exist.
pub async fn update_actor<F>(
    store: &dyn MarketStore,
    id: Uuid,
    mut mutate: F,
) -> MarketResult<Option<Actor>>
where
    F: FnMut(&mut Actor) -> MarketResult<()> + Send,
{
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let Some(mut actor) = store.get_actor(id).await? else {
            return Ok(None);
        };

        let expected = actor.version;
        mutate(&mut actor)?;
        actor.version = expected + 1;

        if store.compare_and_swap(&actor, expected).await? {
            return Ok(Some(actor));
        }

        debug!(actor_id = %id, attempt, "Actor version conflict, retrying");
    }

    Err(MarketError::Unexpected(format!(
        "actor {} update lost {} consecutive version races",
        id, MAX_CAS_ATTEMPTS
    )))
}
