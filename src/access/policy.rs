//! Access policy for seller contact disclosure
//!
//! The policy is an ordered chain of independent gates sharing one
//! signature. Evaluation stops at the first gate that denies, so the order
//! below fixes which reason a caller sees when several conditions fail at
//! once:
//!
//! 1. requester is a buyer
//! 2. requester is not blocked
//! 3. requester trust score meets the minimum
//! 4. requester email, if on file, is verified
//! 5. target seller exists
//! 6. target seller has not opted out of disclosure

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DenialReason, MarketResult};
use crate::models::{Actor, ContactCard, Role};
use crate::store::MarketStore;

/// Default minimum trust score needed to view seller contacts
pub const DEFAULT_MIN_TRUST_SCORE: i32 = 20;

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub min_trust_score: i32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_trust_score: DEFAULT_MIN_TRUST_SCORE,
        }
    }
}

/// Inputs visible to every gate. `target` is `None` until the seller lookup ran.
pub struct GateContext<'a> {
    pub requester: &'a Actor,
    pub target: Option<&'a Actor>,
    pub config: &'a PolicyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Pass,
    Deny {
        reason: DenialReason,
        message: String,
    },
}

impl GateOutcome {
    fn deny(reason: DenialReason, message: impl Into<String>) -> Self {
        GateOutcome::Deny {
            reason,
            message: message.into(),
        }
    }
}

pub type Gate = fn(&GateContext<'_>) -> GateOutcome;

/// Gates that only look at the requester, in evaluation order
pub const REQUESTER_GATES: [Gate; 4] = [
    require_buyer,
    require_unblocked,
    require_min_reputation,
    require_verified_email,
];

/// Gates that look at the target seller, in evaluation order
pub const TARGET_GATES: [Gate; 2] = [require_target_seller, require_sharing_enabled];

pub fn require_buyer(ctx: &GateContext<'_>) -> GateOutcome {
    if ctx.requester.role == Role::Buyer {
        GateOutcome::Pass
    } else {
        GateOutcome::deny(
            DenialReason::RoleNotBuyer,
            "Only authenticated buyers can view seller contact information",
        )
    }
}

pub fn require_unblocked(ctx: &GateContext<'_>) -> GateOutcome {
    if !ctx.requester.is_blocked {
        return GateOutcome::Pass;
    }
    let reason = ctx
        .requester
        .block_reason
        .as_deref()
        .unwrap_or("Policy violation");
    GateOutcome::deny(
        DenialReason::RequesterBlocked,
        format!("Your account has been blocked. Reason: {}", reason),
    )
}

pub fn require_min_reputation(ctx: &GateContext<'_>) -> GateOutcome {
    if ctx.requester.trust_score >= ctx.config.min_trust_score {
        GateOutcome::Pass
    } else {
        GateOutcome::deny(
            DenialReason::ReputationTooLow,
            "Your account reputation is too low to view contact information. Please contact support.",
        )
    }
}

pub fn require_verified_email(ctx: &GateContext<'_>) -> GateOutcome {
    if ctx.requester.has_unverified_email() {
        GateOutcome::deny(
            DenialReason::EmailNotVerified,
            "Please verify your email before viewing contact information",
        )
    } else {
        GateOutcome::Pass
    }
}

pub fn require_target_seller(ctx: &GateContext<'_>) -> GateOutcome {
    match ctx.target {
        Some(target) if target.role == Role::Seller => GateOutcome::Pass,
        _ => GateOutcome::deny(DenialReason::TargetNotFound, "Seller not found"),
    }
}

pub fn require_sharing_enabled(ctx: &GateContext<'_>) -> GateOutcome {
    match ctx.target {
        Some(target) if !target.allow_contact_sharing => GateOutcome::deny(
            DenialReason::DisclosureDisabledByTarget,
            "This seller has disabled contact sharing",
        ),
        _ => GateOutcome::Pass,
    }
}

/// Run gates in order, stopping at the first denial
pub fn run_gates(gates: &[Gate], ctx: &GateContext<'_>) -> GateOutcome {
    gates
        .iter()
        .map(|gate| gate(ctx))
        .find(|outcome| *outcome != GateOutcome::Pass)
        .unwrap_or(GateOutcome::Pass)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow(ContactCard),
    Deny {
        reason: DenialReason,
        message: String,
    },
}

pub struct AccessPolicyEvaluator {
    store: Arc<dyn MarketStore>,
    config: PolicyConfig,
}

impl AccessPolicyEvaluator {
    pub fn new(store: Arc<dyn MarketStore>, config: PolicyConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide whether `requester` may see the contact fields of `target_seller_id`.
    ///
    /// Requester gates run before the seller is loaded, so a denied requester
    /// never causes a lookup.
    pub async fn evaluate(
        &self,
        requester: &Actor,
        target_seller_id: Uuid,
    ) -> MarketResult<PolicyDecision> {
        let ctx = GateContext {
            requester,
            target: None,
            config: &self.config,
        };
        if let GateOutcome::Deny { reason, message } = run_gates(&REQUESTER_GATES, &ctx) {
            debug!(requester = %requester.id, reason = %reason, "Disclosure denied");
            return Ok(PolicyDecision::Deny { reason, message });
        }

        let target = self.store.get_actor(target_seller_id).await?;
        let ctx = GateContext {
            requester,
            target: target.as_ref(),
            config: &self.config,
        };
        if let GateOutcome::Deny { reason, message } = run_gates(&TARGET_GATES, &ctx) {
            debug!(
                requester = %requester.id,
                target = %target_seller_id,
                reason = %reason,
                "Disclosure denied"
            );
            return Ok(PolicyDecision::Deny { reason, message });
        }

        match target {
            Some(seller) => Ok(PolicyDecision::Allow(seller.contact_card())),
            None => Ok(PolicyDecision::Deny {
                reason: DenialReason::TargetNotFound,
                message: "Seller not found".to_string(),
            }),
        }
    }
}
