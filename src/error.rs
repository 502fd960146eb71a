//! Error taxonomy shared by the gating and moderation core
//!
//! Gate and workflow failures are typed outcomes returned to the caller.
//! Only storage or other unexpected failures end up in `Unexpected`, whose
//! detail is logged but never sent back over the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

/// Reason codes reported when the access policy refuses a disclosure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialReason {
    RoleNotBuyer,
    RequesterBlocked,
    ReputationTooLow,
    EmailNotVerified,
    TargetNotFound,
    DisclosureDisabledByTarget,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            DenialReason::RoleNotBuyer => "RoleNotBuyer",
            DenialReason::RequesterBlocked => "RequesterBlocked",
            DenialReason::ReputationTooLow => "ReputationTooLow",
            DenialReason::EmailNotVerified => "EmailNotVerified",
            DenialReason::TargetNotFound => "TargetNotFound",
            DenialReason::DisclosureDisabledByTarget => "DisclosureDisabledByTarget",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Error)]
pub enum MarketError {
    /// Missing or invalid credential
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the caller's role may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    #[error("too many contact requests, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("{message}")]
    PolicyDenied {
        reason: DenialReason,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl MarketError {
    pub fn invalid(message: impl Into<String>) -> Self {
        MarketError::InvalidInput(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        MarketError::Forbidden(message.into())
    }
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        MarketError::Unexpected(err.to_string())
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
