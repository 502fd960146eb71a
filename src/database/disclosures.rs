//! Disclosure Repository - append-only audit trail in PostgreSQL

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::models::{DisclosureEvent, DisclosureFilter, Page};
use crate::store::StoreResult;

fn event_from_row(row: &PgRow) -> DisclosureEvent {
    DisclosureEvent {
        id: row.get("id"),
        buyer_id: row.get("buyer_id"),
        seller_id: row.get("seller_id"),
        viewed_at: row.get("viewed_at"),
        origin: row.get("origin"),
        agent: row.get("agent"),
    }
}

pub struct DisclosureRepository {
    pool: PgPool,
}

impl DisclosureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, event: &DisclosureEvent) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO market.disclosures (id, buyer_id, seller_id, viewed_at, origin, agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(event.buyer_id)
        .bind(event.seller_id)
        .bind(event.viewed_at)
        .bind(&event.origin)
        .bind(&event.agent)
        .execute(&self.pool)
        .await?;

        debug!(event_id = %event.id, "Disclosure event appended");
        Ok(())
    }

    /// Newest first; `page = None` returns every match
    pub async fn query(
        &self,
        filter: &DisclosureFilter,
        page: Option<Page>,
    ) -> StoreResult<(Vec<DisclosureEvent>, u64)> {
        let (limit, offset) = match page {
            Some(page) => (Some(page.limit as i64), page.offset() as i64),
            None => (None, 0),
        };

        // LIMIT NULL means no limit
        let rows = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, viewed_at, origin, agent
            FROM market.disclosures
            WHERE ($1::uuid IS NULL OR buyer_id = $1)
              AND ($2::uuid IS NULL OR seller_id = $2)
              AND ($3::timestamptz IS NULL OR viewed_at >= $3)
            ORDER BY viewed_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.buyer_id)
        .bind(filter.seller_id)
        .bind(filter.since)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM market.disclosures
            WHERE ($1::uuid IS NULL OR buyer_id = $1)
              AND ($2::uuid IS NULL OR seller_id = $2)
              AND ($3::timestamptz IS NULL OR viewed_at >= $3)
            "#,
        )
        .bind(filter.buyer_id)
        .bind(filter.seller_id)
        .bind(filter.since)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.iter().map(event_from_row).collect(), total as u64))
    }
}
