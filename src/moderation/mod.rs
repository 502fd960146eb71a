//! Abuse reports and admin moderation

mod dashboard;
mod workflow;

pub use dashboard::{DEFAULT_USER_LIMIT, DashboardStats, UserQuery, dashboard_stats, list_users};
pub use workflow::{DEFAULT_REPORT_LIMIT, NewReport, ReportWorkflow, ReviewDecision, ReviewOutcome};
