//! Actor Repository - PostgreSQL operations for marketplace users using sqlx

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Actor, ActorFilter, ActorStats, Page, Role};
use crate::store::{StoreError, StoreResult};

const ACTOR_COLUMNS: &str = r#"
    id, name, email, phone, location, role, email_verified, trust_score,
    is_blocked, block_reason, blocked_at, report_count, last_report_at,
    allow_contact_sharing, registered_at, version
"#;

fn actor_from_row(row: &PgRow) -> StoreResult<Actor> {
    let role: String = row.get("role");
    Ok(Actor {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        location: row.get("location"),
        role: role.parse::<Role>().map_err(StoreError::Corrupt)?,
        email_verified: row.get("email_verified"),
        trust_score: row.get("trust_score"),
        is_blocked: row.get("is_blocked"),
        block_reason: row.get("block_reason"),
        blocked_at: row.get("blocked_at"),
        report_count: row.get("report_count"),
        last_report_at: row.get("last_report_at"),
        allow_contact_sharing: row.get("allow_contact_sharing"),
        registered_at: row.get("registered_at"),
        version: row.get("version"),
    })
}

pub struct ActorRepository {
    pool: PgPool,
}

impl ActorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, actor: &Actor) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO market.actors
            (id, name, email, phone, location, role, email_verified, trust_score,
             is_blocked, block_reason, blocked_at, report_count, last_report_at,
             allow_contact_sharing, registered_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(actor.id)
        .bind(&actor.name)
        .bind(&actor.email)
        .bind(&actor.phone)
        .bind(&actor.location)
        .bind(actor.role.as_str())
        .bind(actor.email_verified)
        .bind(actor.trust_score)
        .bind(actor.is_blocked)
        .bind(&actor.block_reason)
        .bind(actor.blocked_at)
        .bind(actor.report_count)
        .bind(actor.last_report_at)
        .bind(actor.allow_contact_sharing)
        .bind(actor.registered_at)
        .bind(actor.version)
        .execute(&self.pool)
        .await?;

        debug!(actor_id = %actor.id, role = %actor.role, "Actor inserted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Option<Actor>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM market.actors WHERE id = $1",
            ACTOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(actor_from_row).transpose()
    }

    /// Conditional write on `version`; zero rows affected means a lost race
    pub async fn compare_and_swap(&self, actor: &Actor, expected_version: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE market.actors SET
                name = $3, email = $4, phone = $5, location = $6, role = $7,
                email_verified = $8, trust_score = $9, is_blocked = $10,
                block_reason = $11, blocked_at = $12, report_count = $13,
                last_report_at = $14, allow_contact_sharing = $15, version = $16
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(actor.id)
        .bind(expected_version)
        .bind(&actor.name)
        .bind(&actor.email)
        .bind(&actor.phone)
        .bind(&actor.location)
        .bind(actor.role.as_str())
        .bind(actor.email_verified)
        .bind(actor.trust_score)
        .bind(actor.is_blocked)
        .bind(&actor.block_reason)
        .bind(actor.blocked_at)
        .bind(actor.report_count)
        .bind(actor.last_report_at)
        .bind(actor.allow_contact_sharing)
        .bind(actor.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list(&self, filter: &ActorFilter, page: Page) -> StoreResult<(Vec<Actor>, u64)> {
        let role = filter.role.map(|r| r.as_str());

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM market.actors
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::boolean IS NULL OR is_blocked = $2)
            ORDER BY registered_at DESC
            LIMIT $3 OFFSET $4
            "#,
            ACTOR_COLUMNS
        ))
        .bind(role)
        .bind(filter.blocked)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM market.actors
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::boolean IS NULL OR is_blocked = $2)
            "#,
        )
        .bind(role)
        .bind(filter.blocked)
        .fetch_one(&self.pool)
        .await?;

        let actors = rows.iter().map(actor_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok((actors, total as u64))
    }

    pub async fn stats(&self) -> StoreResult<ActorStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE role = 'seller') AS sellers,
                COUNT(*) FILTER (WHERE role = 'buyer') AS buyers,
                COUNT(*) FILTER (WHERE is_blocked) AS blocked,
                COUNT(*) FILTER (WHERE email <> '' AND NOT email_verified) AS unverified
            FROM market.actors
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ActorStats {
            total: row.get::<i64, _>("total") as u64,
            sellers: row.get::<i64, _>("sellers") as u64,
            buyers: row.get::<i64, _>("buyers") as u64,
            blocked: row.get::<i64, _>("blocked") as u64,
            unverified: row.get::<i64, _>("unverified") as u64,
        })
    }
}
