//! Reputation Ledger - bounded trust-score and block-state mutations
//!
//! Every write goes through [`update_actor`], so concurrent moderation
//! actions against the same actor never lose an update.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{MarketError, MarketResult};
use crate::models::{Actor, MAX_TRUST_SCORE, MIN_TRUST_SCORE};
use crate::store::{MarketStore, update_actor};

/// Trust points removed by a `reputation-reduced` moderation action
pub const REPORT_PENALTY: i32 = 10;

/// Clamp a score into the valid trust range
pub fn clamp_score(score: i32) -> i32 {
    score.clamp(MIN_TRUST_SCORE, MAX_TRUST_SCORE)
}

/// Apply a signed delta, saturating at the range bounds
pub fn apply_delta(actor: &mut Actor, delta: i32) -> i32 {
    actor.trust_score = clamp_score(actor.trust_score.saturating_add(delta));
    actor.trust_score
}

pub fn apply_block(actor: &mut Actor, reason: Option<String>) {
    actor.is_blocked = true;
    actor.block_reason = reason;
    actor.blocked_at = Some(Utc::now());
}

pub fn apply_unblock(actor: &mut Actor) {
    actor.is_blocked = false;
    actor.block_reason = None;
    actor.blocked_at = None;
}

pub struct ReputationLedger {
    store: Arc<dyn MarketStore>,
}

impl ReputationLedger {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// Adjust the trust score by `delta`, returning the clamped new score
    pub async fn adjust(&self, actor_id: Uuid, delta: i32) -> MarketResult<i32> {
        let actor = update_actor(self.store.as_ref(), actor_id, |actor| {
            apply_delta(actor, delta);
            Ok(())
        })
        .await?
        .ok_or(MarketError::NotFound("user"))?;

        info!(actor_id = %actor_id, delta, score = actor.trust_score, "Trust score adjusted");
        Ok(actor.trust_score)
    }

    /// Set an absolute trust score. Values outside the valid range are rejected, not clamped.
    pub async fn set_score(&self, actor_id: Uuid, score: i32) -> MarketResult<Actor> {
        if !(MIN_TRUST_SCORE..=MAX_TRUST_SCORE).contains(&score) {
            return Err(MarketError::invalid(format!(
                "Reputation must be between {} and {}",
                MIN_TRUST_SCORE, MAX_TRUST_SCORE
            )));
        }

        let actor = update_actor(self.store.as_ref(), actor_id, |actor| {
            actor.trust_score = score;
            Ok(())
        })
        .await?
        .ok_or(MarketError::NotFound("user"))?;

        info!(actor_id = %actor_id, score, "Trust score set");
        Ok(actor)
    }

    pub async fn block(&self, actor_id: Uuid, reason: Option<String>) -> MarketResult<Actor> {
        self.try_block(actor_id, reason)
            .await?
            .ok_or(MarketError::NotFound("user"))
    }

    pub async fn unblock(&self, actor_id: Uuid) -> MarketResult<Actor> {
        let actor = update_actor(self.store.as_ref(), actor_id, |actor| {
            apply_unblock(actor);
            Ok(())
        })
        .await?
        .ok_or(MarketError::NotFound("user"))?;

        info!(actor_id = %actor_id, "User unblocked");
        Ok(actor)
    }

    /// Block, tolerating a missing actor (`Ok(None)`)
    pub async fn try_block(
        &self,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> MarketResult<Option<Actor>> {
        let actor = update_actor(self.store.as_ref(), actor_id, |actor| {
            apply_block(actor, reason.clone());
            Ok(())
        })
        .await?;

        if actor.is_some() {
            info!(actor_id = %actor_id, reason = ?reason, "User blocked");
        }
        Ok(actor)
    }

    /// Penalty applied for an upheld report: score down by [`REPORT_PENALTY`],
    /// report counter up, last-report timestamp now. Tolerates a missing actor.
    pub async fn record_report_penalty(&self, actor_id: Uuid) -> MarketResult<Option<Actor>> {
        let actor = update_actor(self.store.as_ref(), actor_id, |actor| {
            apply_delta(actor, -REPORT_PENALTY);
            actor.report_count = actor.report_count.saturating_add(1);
            actor.last_report_at = Some(Utc::now());
            Ok(())
        })
        .await?;

        if let Some(ref actor) = actor {
            info!(
                actor_id = %actor_id,
                score = actor.trust_score,
                report_count = actor.report_count,
                "Report penalty applied"
            );
        }
        Ok(actor)
    }
}
