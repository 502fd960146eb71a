//! PostgreSQL Database Module
//!
//! Provides database operations for actors, disclosure events and reports.
//! [`DatabasePool`] implements the storage traits in [`crate::store`].

pub mod actors;
pub mod disclosures;
pub mod pool;
pub mod reports;

pub use actors::ActorRepository;
pub use disclosures::DisclosureRepository;
pub use pool::DatabasePool;
pub use reports::ReportRepository;
