//! Per-account disclosure settings

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::{MarketError, MarketResult};
use crate::models::{Actor, Role};
use crate::store::{MarketStore, update_actor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSettings {
    pub role: Role,
    pub allow_contact_sharing: bool,
    pub email_verified: bool,
    pub trust_score: i32,
}

impl From<&Actor> for AccountSettings {
    fn from(actor: &Actor) -> Self {
        Self {
            role: actor.role,
            allow_contact_sharing: actor.allow_contact_sharing,
            email_verified: actor.email_verified,
            trust_score: actor.trust_score,
        }
    }
}

pub struct SettingsService {
    store: Arc<dyn MarketStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// Settings as currently stored, not as carried by the caller's token
    pub async fn view(&self, actor: &Actor) -> MarketResult<AccountSettings> {
        let stored = self
            .store
            .get_actor(actor.id)
            .await?
            .ok_or(MarketError::NotFound("user"))?;
        Ok(AccountSettings::from(&stored))
    }

    /// Opt a seller in or out of contact disclosure
    pub async fn set_contact_sharing(
        &self,
        actor: &Actor,
        allow: bool,
    ) -> MarketResult<AccountSettings> {
        if actor.role != Role::Seller {
            return Err(MarketError::forbidden(
                "Only sellers can change contact sharing",
            ));
        }

        let updated = update_actor(self.store.as_ref(), actor.id, |a| {
            a.allow_contact_sharing = allow;
            Ok(())
        })
        .await?
        .ok_or(MarketError::NotFound("user"))?;

        info!(actor_id = %actor.id, allow, "Contact sharing updated");
        Ok(AccountSettings::from(&updated))
    }
}
