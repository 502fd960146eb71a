//! Contact disclosure endpoint
//!
//! Endpoints:
//!   GET /api/contact/{seller_id} -> Seller contact card (buyers only, rate limited)

use axum::{Extension, Json, extract::State};
use uuid::Uuid;

use super::AppState;
use super::extract::ApiPath;
use super::middleware::AuthenticatedActor;
use crate::access::RequestOrigin;
use crate::error::MarketResult;
use crate::models::ContactCard;

pub async fn get_contact(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(requester)): Extension<AuthenticatedActor>,
    Extension(origin): Extension<RequestOrigin>,
    ApiPath(seller_id): ApiPath<Uuid>,
) -> MarketResult<Json<ContactCard>> {
    let card = state.contact.disclose(&requester, seller_id, &origin).await?;
    Ok(Json(card))
}
