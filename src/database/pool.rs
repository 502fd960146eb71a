//! Database Connection Pool using sqlx

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::database::actors::ActorRepository;
use crate::database::disclosures::DisclosureRepository;
use crate::database::reports::ReportRepository;
use crate::models::{
    Actor, ActorFilter, ActorStats, DisclosureEvent, DisclosureFilter, Page, Report, ReportStats,
    ReportStatus,
};
use crate::store::{ActorStore, DisclosureStore, ReportStore, StoreResult};

/// Schema bootstrap, applied in order
const SCHEMA: &[(&str, &str)] = &[
    ("schema", "CREATE SCHEMA IF NOT EXISTS market"),
    (
        "actors table",
        r#"
        CREATE TABLE IF NOT EXISTS market.actors (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            location TEXT,
            role TEXT NOT NULL,
            email_verified BOOLEAN NOT NULL DEFAULT FALSE,
            trust_score INTEGER NOT NULL DEFAULT 100
                CHECK (trust_score BETWEEN 0 AND 100),
            is_blocked BOOLEAN NOT NULL DEFAULT FALSE,
            block_reason TEXT,
            blocked_at TIMESTAMPTZ,
            report_count INTEGER NOT NULL DEFAULT 0,
            last_report_at TIMESTAMPTZ,
            allow_contact_sharing BOOLEAN NOT NULL DEFAULT TRUE,
            registered_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            version BIGINT NOT NULL DEFAULT 0
        )
        "#,
    ),
    (
        "disclosures table",
        r#"
        CREATE TABLE IF NOT EXISTS market.disclosures (
            id UUID PRIMARY KEY,
            buyer_id UUID NOT NULL,
            seller_id UUID NOT NULL,
            viewed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            origin TEXT,
            agent TEXT
        )
        "#,
    ),
    (
        "reports table",
        r#"
        CREATE TABLE IF NOT EXISTS market.reports (
            id UUID PRIMARY KEY,
            reporter_id UUID NOT NULL,
            reported_id UUID NOT NULL,
            reason TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            action TEXT,
            reviewed_by UUID,
            reviewed_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CHECK (reporter_id <> reported_id)
        )
        "#,
    ),
    (
        "disclosure pair index",
        "CREATE INDEX IF NOT EXISTS disclosures_buyer_seller_idx ON market.disclosures (buyer_id, seller_id)",
    ),
    (
        "disclosure time index",
        "CREATE INDEX IF NOT EXISTS disclosures_viewed_at_idx ON market.disclosures (viewed_at DESC)",
    ),
    (
        "report subject index",
        "CREATE INDEX IF NOT EXISTS reports_reported_status_idx ON market.reports (reported_id, status)",
    ),
    (
        "report time index",
        "CREATE INDEX IF NOT EXISTS reports_created_at_idx ON market.reports (created_at DESC)",
    ),
    (
        "actor registration index",
        "CREATE INDEX IF NOT EXISTS actors_registered_at_idx ON market.actors (registered_at DESC)",
    ),
];

pub struct DatabasePool {
    pool: PgPool,
    actors: ActorRepository,
    disclosures: DisclosureRepository,
    reports: ReportRepository,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, String> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| format!("Failed to connect to PostgreSQL: {}", e))?;

        info!("Connected to PostgreSQL");

        Ok(Self {
            actors: ActorRepository::new(pool.clone()),
            disclosures: DisclosureRepository::new(pool.clone()),
            reports: ReportRepository::new(pool.clone()),
            pool,
        })
    }

    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing database schema...");

        for (name, statement) in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(|e| format!("Failed to create {}: {}", name, e))?;
        }

        info!("Database schema initialized");
        Ok(())
    }

    pub fn actors(&self) -> &ActorRepository {
        &self.actors
    }

    pub fn disclosures(&self) -> &DisclosureRepository {
        &self.disclosures
    }

    pub fn reports(&self) -> &ReportRepository {
        &self.reports
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ActorStore for DatabasePool {
    async fn insert_actor(&self, actor: &Actor) -> StoreResult<()> {
        self.actors.insert(actor).await
    }

    async fn get_actor(&self, id: Uuid) -> StoreResult<Option<Actor>> {
        self.actors.get(id).await
    }

    async fn compare_and_swap(&self, actor: &Actor, expected_version: i64) -> StoreResult<bool> {
        self.actors.compare_and_swap(actor, expected_version).await
    }

    async fn list_actors(
        &self,
        filter: &ActorFilter,
        page: Page,
    ) -> StoreResult<(Vec<Actor>, u64)> {
        self.actors.list(filter, page).await
    }

    async fn actor_stats(&self) -> StoreResult<ActorStats> {
        self.actors.stats().await
    }
}

#[async_trait]
impl DisclosureStore for DatabasePool {
    async fn append_disclosure(&self, event: &DisclosureEvent) -> StoreResult<()> {
        self.disclosures.append(event).await
    }

    async fn query_disclosures(
        &self,
        filter: &DisclosureFilter,
        page: Option<Page>,
    ) -> StoreResult<(Vec<DisclosureEvent>, u64)> {
        self.disclosures.query(filter, page).await
    }
}

#[async_trait]
impl ReportStore for DatabasePool {
    async fn insert_report(&self, report: &Report) -> StoreResult<()> {
        self.reports.insert(report).await
    }

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<Report>> {
        self.reports.get(id).await
    }

    async fn reports_by_reporter(&self, reporter_id: Uuid) -> StoreResult<Vec<Report>> {
        self.reports.by_reporter(reporter_id).await
    }

    async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: Page,
    ) -> StoreResult<(Vec<Report>, u64)> {
        self.reports.list(status, page).await
    }

    async fn complete_review(&self, report: &Report) -> StoreResult<bool> {
        self.reports.complete_review(report).await
    }

    async fn reopen_review(&self, report: &Report) -> StoreResult<bool> {
        self.reports.reopen_review(report).await
    }

    async fn report_stats(&self) -> StoreResult<ReportStats> {
        self.reports.stats().await
    }
}
