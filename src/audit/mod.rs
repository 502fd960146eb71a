//! Disclosure audit trail
//!
//! Every successful contact disclosure appends exactly one immutable event.
//! Administrators query the trail with filters or export it as CSV.

mod auditor;
pub mod export;

pub use auditor::{
    DEFAULT_EXPORT_DAYS, DEFAULT_LIST_DAYS, DEFAULT_LIST_LIMIT, DisclosureAuditor,
    DisclosureCounts, DisclosureExport, DisclosureQuery, DisclosureView,
};
pub use export::{EXPORT_COLUMNS, ExportRow};
