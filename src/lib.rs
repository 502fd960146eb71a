//! Agri Market contact service
//!
//! Contact-disclosure gating and moderation for a produce marketplace:
//! decides whether a buyer may see a seller's private contact details,
//! records every disclosure, and lets administrators act on abuse reports.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Error taxonomy
//! ├── settings.rs    - Seller disclosure opt-out
//! ├── models/        - Actors, disclosure events, reports, pagination
//! ├── access/        - Disclosure gating
//! │   ├── rate_limit.rs - Sliding-window limiter
//! │   └── policy.rs     - Ordered gate chain
//! ├── audit/         - Disclosure audit trail
//! │   ├── auditor.rs - Record, list, count
//! │   └── export.rs  - CSV export
//! ├── moderation/    - Abuse reports
//! │   ├── workflow.rs  - Report state machine
//! │   └── dashboard.rs - Admin counters and user directory
//! ├── reputation/    - Trust score and block state
//! │   └── ledger.rs  - Compare-and-swap mutations
//! ├── store/         - Storage traits and in-memory store
//! ├── database/      - PostgreSQL persistence
//! └── api/           - HTTP API endpoints and middleware
//! ```

pub mod access;
pub mod api;
pub mod audit;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod moderation;
pub mod reputation;
pub mod settings;
pub mod store;

// Re-export main types for convenience
pub use access::{
    AccessPolicyEvaluator, ContactDisclosureService, ContactRateLimiter, PolicyConfig,
    PolicyDecision, RateDecision, RequestOrigin, SlidingWindowLimiter,
};
pub use api::{AppState, SecurityMiddlewareConfig, TokenVerifier, create_router};
pub use audit::{DisclosureAuditor, DisclosureQuery};
pub use config::MarketConfig;
pub use database::DatabasePool;
pub use error::{DenialReason, MarketError, MarketResult};
pub use models::{
    Actor, ActorSummary, ContactCard, DisclosureEvent, Page, Paginated, Report, ReportAction,
    ReportStatus, Role,
};
pub use moderation::{NewReport, ReportWorkflow, ReviewDecision, ReviewOutcome};
pub use reputation::ReputationLedger;
pub use settings::{AccountSettings, SettingsService};
pub use store::{MarketStore, MemoryStore, StoreError};
