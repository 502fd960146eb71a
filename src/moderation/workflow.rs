//! Report Workflow - from filed abuse report to reviewed outcome
//!
//! ```text
//!            review (admin)
//! pending ──────────────────► reviewed | resolved | dismissed
//! ```
//!
//! Only `pending` has an outgoing transition. A report is reviewed at most
//! once, so its moderation action is applied at most once.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{MarketError, MarketResult};
use crate::models::{Actor, Page, Paginated, Report, ReportAction, ReportStatus};
use crate::reputation::ReputationLedger;
use crate::store::MarketStore;

/// Default admin listing page size
pub const DEFAULT_REPORT_LIMIT: u32 = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    #[serde(alias = "reportedId")]
    pub reported_id: Option<Uuid>,
    pub reason: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReviewDecision {
    pub status: ReportStatus,
    pub action: Option<ReportAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub report: Report,
    /// The reported actor after the action, `None` if it no longer exists
    pub subject: Option<Actor>,
}

pub struct ReportWorkflow {
    store: Arc<dyn MarketStore>,
    ledger: Arc<ReputationLedger>,
}

impl ReportWorkflow {
    pub fn new(store: Arc<dyn MarketStore>, ledger: Arc<ReputationLedger>) -> Self {
        Self { store, ledger }
    }

    /// File a report against another actor. Any authenticated actor may file.
    pub async fn file(&self, reporter: &Actor, new: NewReport) -> MarketResult<Report> {
        let reason = new.reason.map(|r| r.trim().to_string()).unwrap_or_default();
        let (Some(reported_id), false) = (new.reported_id, reason.is_empty()) else {
            return Err(MarketError::invalid("Missing required fields"));
        };

        if reported_id == reporter.id {
            return Err(MarketError::invalid("You cannot report yourself"));
        }

        if self.store.get_actor(reported_id).await?.is_none() {
            return Err(MarketError::NotFound("user"));
        }

        let description = new.description.filter(|d| !d.trim().is_empty());
        let report = Report::new(reporter.id, reported_id, reason, description);
        self.store.insert_report(&report).await?;

        info!(
            report_id = %report.id,
            reporter = %reporter.id,
            reported = %reported_id,
            reason = %report.reason,
            "Report filed"
        );
        Ok(report)
    }

    /// Reports filed by `reporter`, newest first
    pub async fn list_own(&self, reporter: &Actor) -> MarketResult<Vec<Report>> {
        Ok(self.store.reports_by_reporter(reporter.id).await?)
    }

    /// Admin listing; `status = None` lists every report
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> MarketResult<Paginated<Report>> {
        let page = Page::new(page, limit, DEFAULT_REPORT_LIMIT);
        let (reports, total) = self.store.list_reports(status, page).await?;
        Ok(Paginated::new(reports, total, page))
    }

    /// Move a pending report to a terminal status and apply its action.
    ///
    /// The status transition is committed first. If the reported actor no
    /// longer exists the report still records the review; if applying the
    /// action fails the report goes back to `pending` and the error is returned.
    pub async fn review(
        &self,
        admin: &Actor,
        report_id: Uuid,
        decision: ReviewDecision,
    ) -> MarketResult<ReviewOutcome> {
        if !admin.is_admin() {
            return Err(MarketError::forbidden("Admin access required"));
        }
        if decision.status == ReportStatus::Pending {
            return Err(MarketError::invalid(
                "Review status must be reviewed, resolved or dismissed",
            ));
        }

        let mut report = self
            .store
            .get_report(report_id)
            .await?
            .ok_or(MarketError::NotFound("report"))?;

        if report.status.is_terminal() {
            return Err(MarketError::invalid("Report has already been reviewed"));
        }

        report.status = decision.status;
        report.action = decision.action;
        report.reviewed_by = Some(admin.id);
        report.reviewed_at = Some(Utc::now());

        if !self.store.complete_review(&report).await? {
            // Lost the race against a concurrent review
            return Err(MarketError::invalid("Report has already been reviewed"));
        }

        info!(
            report_id = %report.id,
            reviewer = %admin.id,
            status = %report.status,
            action = ?report.action,
            "Report reviewed"
        );

        let subject = match self.apply_action(&report).await {
            Ok(subject) => subject,
            Err(e) => {
                error!(
                    report_id = %report.id,
                    reported = %report.reported_id,
                    "Moderation action failed, reopening report: {}",
                    e
                );
                self.reopen(&report).await;
                return Err(e);
            }
        };

        Ok(ReviewOutcome { report, subject })
    }

    /// Return a report whose action never landed to `pending` so it can be reviewed again
    async fn reopen(&self, report: &Report) {
        match self.store.reopen_review(report).await {
            Ok(true) => warn!(report_id = %report.id, "Report returned to pending"),
            Ok(false) => warn!(report_id = %report.id, "Report changed before it could be reopened"),
            Err(e) => error!(report_id = %report.id, "Failed to reopen report: {}", e),
        }
    }

    async fn apply_action(&self, report: &Report) -> MarketResult<Option<Actor>> {
        let subject = match report.action {
            Some(ReportAction::ReputationReduced) => {
                self.ledger.record_report_penalty(report.reported_id).await?
            }
            Some(ReportAction::Blocked) => {
                self.ledger
                    .try_block(report.reported_id, Some(report.reason.clone()))
                    .await?
            }
            Some(ReportAction::None) | Some(ReportAction::Warned) | None => {
                self.store.get_actor(report.reported_id).await?
            }
        };

        if subject.is_none() {
            warn!(
                report_id = %report.id,
                reported = %report.reported_id,
                "Reported user no longer exists, no action applied"
            );
        }
        Ok(subject)
    }
}
