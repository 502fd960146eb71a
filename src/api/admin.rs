//! Admin moderation API
//!
//! Endpoints (all require an admin token):
//!   GET   /api/admin/stats                  -> Dashboard counters
//!   GET   /api/admin/users                  -> User directory (?role&blocked&page&limit)
//!   PATCH /api/admin/users/{id}/block       -> Block or unblock a user
//!   PATCH /api/admin/users/{id}/reputation  -> Set a trust score
//!   GET   /api/admin/reports                -> Reports (?status&page&limit, status=all lists every report)
//!   PATCH /api/admin/reports/{id}/review    -> Review a pending report
//!   GET   /api/admin/disclosures            -> Disclosure audit trail
//!   GET   /api/admin/disclosures/export     -> Audit trail as CSV

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::middleware::AuthenticatedActor;
use crate::audit::{DisclosureQuery, DisclosureView};
use crate::error::{MarketError, MarketResult};
use crate::models::{ActorSummary, Paginated, Report, ReportStatus};
use crate::moderation::{
    DashboardStats, ReviewDecision, ReviewOutcome, UserQuery, dashboard_stats, list_users,
};

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    #[serde(alias = "isBlocked")]
    pub blocked: bool,
    #[serde(default, alias = "blockReason")]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReputationRequest {
    pub reputation: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// A status name, or `all`; defaults to `pending`
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ReportQuery {
    fn status_filter(&self) -> MarketResult<Option<ReportStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(Some(ReportStatus::Pending)),
            Some("all") => Ok(None),
            Some(status) => status.parse().map(Some).map_err(MarketError::InvalidInput),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub days: Option<u32>,
}

#[derive(Serialize)]
pub struct UserUpdated {
    pub msg: &'static str,
    pub user: ActorSummary,
}

#[derive(Serialize)]
pub struct ReportReviewed {
    pub msg: &'static str,
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

pub async fn get_stats(State(state): State<AppState>) -> MarketResult<Json<DashboardStats>> {
    Ok(Json(dashboard_stats(state.store.as_ref(), &state.auditor).await?))
}

pub async fn get_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> MarketResult<Json<Paginated<ActorSummary>>> {
    Ok(Json(list_users(state.store.as_ref(), &query).await?))
}

pub async fn set_block(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(admin)): Extension<AuthenticatedActor>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<BlockRequest>,
) -> MarketResult<Json<UserUpdated>> {
    let (user, msg) = if body.blocked {
        let reason = body.reason.filter(|r| !r.trim().is_empty());
        (state.ledger.block(user_id, reason).await?, "User blocked successfully")
    } else {
        (state.ledger.unblock(user_id).await?, "User unblocked successfully")
    };

    info!(admin = %admin.id, user = %user_id, blocked = body.blocked, "Admin changed block state");
    Ok(Json(UserUpdated {
        msg,
        user: user.summary(),
    }))
}

pub async fn set_reputation(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(admin)): Extension<AuthenticatedActor>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ReputationRequest>,
) -> MarketResult<Json<UserUpdated>> {
    let user = state.ledger.set_score(user_id, body.reputation).await?;

    info!(admin = %admin.id, user = %user_id, score = body.reputation, "Admin set reputation");
    Ok(Json(UserUpdated {
        msg: "Reputation updated",
        user: user.summary(),
    }))
}

pub async fn get_reports(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> MarketResult<Json<Paginated<Report>>> {
    let status = query.status_filter()?;
    Ok(Json(state.reports.list(status, query.page, query.limit).await?))
}

pub async fn review_report(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(admin)): Extension<AuthenticatedActor>,
    ApiPath(report_id): ApiPath<Uuid>,
    ApiJson(decision): ApiJson<ReviewDecision>,
) -> MarketResult<Json<ReportReviewed>> {
    let outcome = state.reports.review(&admin, report_id, decision).await?;
    Ok(Json(ReportReviewed {
        msg: "Report reviewed",
        outcome,
    }))
}

pub async fn get_disclosures(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DisclosureQuery>,
) -> MarketResult<Json<Paginated<DisclosureView>>> {
    Ok(Json(state.auditor.list(&query).await?))
}

pub async fn export_disclosures(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> MarketResult<Response> {
    let export = state.auditor.export(query.days).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename
    ))
    .map_err(|e| MarketError::Unexpected(format!("content disposition: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(status: Option<&str>) -> ReportQuery {
        ReportQuery {
            status: status.map(str::to_string),
            page: None,
            limit: None,
        }
    }

    #[test]
    fn test_report_status_filter() {
        assert_eq!(query(None).status_filter().unwrap(), Some(ReportStatus::Pending));
        assert_eq!(query(Some("all")).status_filter().unwrap(), None);
        assert_eq!(
            query(Some("resolved")).status_filter().unwrap(),
            Some(ReportStatus::Resolved)
        );
        assert!(matches!(
            query(Some("closed")).status_filter(),
            Err(MarketError::InvalidInput(_))
        ));
    }
}
