//! HTTP API for the marketplace contact service
//!
//! Provides REST APIs for:
//! - Contact disclosure (buyers)
//! - Abuse reports and account settings (any signed-in user)
//! - Moderation and audit (admins)
//! - Security middleware (auth, headers, body limits, request logging)

pub mod admin;
pub mod contact;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod reports;
pub mod settings;

pub use error::ErrorBody;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use middleware::{
    AuthenticatedActor, Claims, SecurityMiddlewareConfig, SecurityState, TokenVerifier,
    auth_middleware, body_size_middleware, logging_middleware, require_admin_middleware,
    security_headers_middleware,
};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::access::{AccessPolicyEvaluator, ContactDisclosureService, ContactRateLimiter, PolicyConfig};
use crate::audit::DisclosureAuditor;
use crate::moderation::ReportWorkflow;
use crate::reputation::ReputationLedger;
use crate::settings::SettingsService;
use crate::store::MarketStore;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub contact: Arc<ContactDisclosureService>,
    pub auditor: Arc<DisclosureAuditor>,
    pub ledger: Arc<ReputationLedger>,
    pub reports: Arc<ReportWorkflow>,
    pub settings: Arc<SettingsService>,
    pub security: SecurityState,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MarketStore>,
        limiter: Arc<dyn ContactRateLimiter>,
        policy: PolicyConfig,
        tokens: Arc<TokenVerifier>,
        security: SecurityMiddlewareConfig,
    ) -> Self {
        let auditor = Arc::new(DisclosureAuditor::new(store.clone()));
        let ledger = Arc::new(ReputationLedger::new(store.clone()));
        let contact = ContactDisclosureService::new(
            limiter,
            AccessPolicyEvaluator::new(store.clone(), policy),
            auditor.clone(),
        );

        Self {
            contact: Arc::new(contact),
            reports: Arc::new(ReportWorkflow::new(store.clone(), ledger.clone())),
            settings: Arc::new(SettingsService::new(store.clone())),
            security: SecurityState::new(security, tokens, store.clone()),
            store,
            auditor,
            ledger,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Full application router with security middleware applied
pub fn create_router(state: AppState) -> Router {
    let security = state.security.clone();

    let admin = Router::new()
        .route("/stats", get(admin::get_stats))
        .route("/users", get(admin::get_users))
        .route("/users/{id}/block", patch(admin::set_block))
        .route("/users/{id}/reputation", patch(admin::set_reputation))
        .route("/reports", get(admin::get_reports))
        .route("/reports/{id}/review", patch(admin::review_report))
        .route("/disclosures", get(admin::get_disclosures))
        .route("/disclosures/export", get(admin::export_disclosures))
        .route_layer(from_fn(require_admin_middleware));

    let api = Router::new()
        .route("/contact/{seller_id}", get(contact::get_contact))
        .route("/reports", post(reports::file_report))
        .route("/reports/mine", get(reports::my_reports))
        .route("/settings", get(settings::get_settings))
        .route(
            "/settings/contact-sharing",
            patch(settings::update_contact_sharing),
        )
        .nest("/admin", admin)
        .route_layer(from_fn_with_state(security.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        // Apply security middleware layers (order matters!)
        .layer(from_fn_with_state(security.clone(), body_size_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn_with_state(security, logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
