//! Contact disclosure gating
//!
//! A disclosure request passes three stages in order: the rate limiter,
//! the access policy, then the audit write. Only a request that clears all
//! three returns a contact card, and every returned card has exactly one
//! audit event behind it.

pub mod policy;
pub mod rate_limit;

pub use policy::{AccessPolicyEvaluator, DEFAULT_MIN_TRUST_SCORE, PolicyConfig, PolicyDecision};
pub use rate_limit::{
    ContactRateLimiter, DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW, RateDecision, SlidingWindowLimiter,
    rate_limit_key,
};

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::DisclosureAuditor;
use crate::error::{MarketError, MarketResult};
use crate::models::{Actor, ContactCard};

/// Network origin and client agent of an inbound request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub address: Option<String>,
    pub agent: Option<String>,
}

pub struct ContactDisclosureService {
    limiter: Arc<dyn ContactRateLimiter>,
    policy: AccessPolicyEvaluator,
    auditor: Arc<DisclosureAuditor>,
}

impl ContactDisclosureService {
    pub fn new(
        limiter: Arc<dyn ContactRateLimiter>,
        policy: AccessPolicyEvaluator,
        auditor: Arc<DisclosureAuditor>,
    ) -> Self {
        Self {
            limiter,
            policy,
            auditor,
        }
    }

    /// Reveal a seller's contact card to `requester`.
    ///
    /// The attempt counts against the limiter even when the policy then
    /// denies it. If the audit write fails the card is withheld.
    pub async fn disclose(
        &self,
        requester: &Actor,
        seller_id: Uuid,
        origin: &RequestOrigin,
    ) -> MarketResult<ContactCard> {
        let key = rate_limit_key(Some(requester), origin.address.as_deref());
        if let RateDecision::Deny { retry_after_secs } = self.limiter.check_and_record(&key).await {
            warn!(requester = %requester.id, retry_after_secs, "Contact request rate limited");
            return Err(MarketError::RateLimited { retry_after_secs });
        }

        let card = match self.policy.evaluate(requester, seller_id).await? {
            PolicyDecision::Allow(card) => card,
            PolicyDecision::Deny { reason, message } => {
                return Err(MarketError::PolicyDenied { reason, message });
            }
        };

        self.auditor
            .record(
                requester.id,
                seller_id,
                origin.address.clone(),
                origin.agent.clone(),
            )
            .await?;

        debug!(requester = %requester.id, seller = %seller_id, "Contact card released");
        Ok(card)
    }
}
