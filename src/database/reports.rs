//! Report Repository - abuse reports and their review state

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Page, Report, ReportAction, ReportStats, ReportStatus};
use crate::store::{StoreError, StoreResult};

const REPORT_COLUMNS: &str = r#"
    id, reporter_id, reported_id, reason, description, status, action,
    reviewed_by, reviewed_at, created_at
"#;

fn report_from_row(row: &PgRow) -> StoreResult<Report> {
    let status: String = row.get("status");
    let action: Option<String> = row.get("action");
    Ok(Report {
        id: row.get("id"),
        reporter_id: row.get("reporter_id"),
        reported_id: row.get("reported_id"),
        reason: row.get("reason"),
        description: row.get("description"),
        status: status.parse::<ReportStatus>().map_err(StoreError::Corrupt)?,
        action: action
            .map(|a| a.parse::<ReportAction>())
            .transpose()
            .map_err(StoreError::Corrupt)?,
        reviewed_by: row.get("reviewed_by"),
        reviewed_at: row.get("reviewed_at"),
        created_at: row.get("created_at"),
    })
}

pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, report: &Report) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO market.reports
            (id, reporter_id, reported_id, reason, description, status, action,
             reviewed_by, reviewed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(report.id)
        .bind(report.reporter_id)
        .bind(report.reported_id)
        .bind(&report.reason)
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(report.action.map(|a| a.as_str()))
        .bind(report.reviewed_by)
        .bind(report.reviewed_at)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;

        debug!(report_id = %report.id, "Report inserted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Option<Report>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM market.reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(report_from_row).transpose()
    }

    pub async fn by_reporter(&self, reporter_id: Uuid) -> StoreResult<Vec<Report>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM market.reports WHERE reporter_id = $1 ORDER BY created_at DESC",
            REPORT_COLUMNS
        ))
        .bind(reporter_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(report_from_row).collect()
    }

    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        page: Page,
    ) -> StoreResult<(Vec<Report>, u64)> {
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM market.reports
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            REPORT_COLUMNS
        ))
        .bind(status)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM market.reports WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let reports = rows.iter().map(report_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok((reports, total as u64))
    }

    /// Only a pending row is updated, so at most one review wins
    pub async fn complete_review(&self, report: &Report) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE market.reports
            SET status = $2, action = $3, reviewed_by = $4, reviewed_at = $5
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(report.id)
        .bind(report.status.as_str())
        .bind(report.action.map(|a| a.as_str()))
        .bind(report.reviewed_by)
        .bind(report.reviewed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn reopen_review(&self, report: &Report) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE market.reports
            SET status = 'pending', action = NULL, reviewed_by = NULL, reviewed_at = NULL
            WHERE id = $1 AND status = $2 AND reviewed_by IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(report.id)
        .bind(report.status.as_str())
        .bind(report.reviewed_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn stats(&self) -> StoreResult<ReportStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'resolved') AS resolved
            FROM market.reports
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ReportStats {
            total: row.get::<i64, _>("total") as u64,
            pending: row.get::<i64, _>("pending") as u64,
            resolved: row.get::<i64, _>("resolved") as u64,
        })
    }
}
