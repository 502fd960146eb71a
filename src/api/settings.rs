//! Account settings endpoints
//!
//! Endpoints:
//!   GET   /api/settings                 -> Caller's disclosure settings
//!   PATCH /api/settings/contact-sharing -> Seller opt-in/opt-out

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use super::AppState;
use super::extract::ApiJson;
use super::middleware::AuthenticatedActor;
use crate::error::MarketResult;
use crate::settings::AccountSettings;

#[derive(Debug, Deserialize)]
pub struct ContactSharingRequest {
    #[serde(alias = "allowContactSharing")]
    pub allow_contact_sharing: bool,
}

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(actor)): Extension<AuthenticatedActor>,
) -> MarketResult<Json<AccountSettings>> {
    Ok(Json(state.settings.view(&actor).await?))
}

pub async fn update_contact_sharing(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(actor)): Extension<AuthenticatedActor>,
    ApiJson(body): ApiJson<ContactSharingRequest>,
) -> MarketResult<Json<AccountSettings>> {
    let settings = state
        .settings
        .set_contact_sharing(&actor, body.allow_contact_sharing)
        .await?;
    Ok(Json(settings))
}
