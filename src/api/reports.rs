//! Abuse report endpoints for any signed-in user
//!
//! Endpoints:
//!   POST /api/reports      -> File a report
//!   GET  /api/reports/mine -> Reports filed by the caller

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Serialize;

use super::AppState;
use super::extract::ApiJson;
use super::middleware::AuthenticatedActor;
use crate::error::MarketResult;
use crate::models::Report;
use crate::moderation::NewReport;

#[derive(Serialize)]
pub struct ReportFiled {
    pub msg: &'static str,
    pub report: Report,
}

pub async fn file_report(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(reporter)): Extension<AuthenticatedActor>,
    ApiJson(body): ApiJson<NewReport>,
) -> MarketResult<(StatusCode, Json<ReportFiled>)> {
    let report = state.reports.file(&reporter, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReportFiled {
            msg: "Report submitted successfully. Our team will review it.",
            report,
        }),
    ))
}

pub async fn my_reports(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(reporter)): Extension<AuthenticatedActor>,
) -> MarketResult<Json<Vec<Report>>> {
    Ok(Json(state.reports.list_own(&reporter).await?))
}
