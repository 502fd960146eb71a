//! Request extractors that report rejections as [`MarketError`]
//!
//! axum's own `Json`, `Path` and `Query` answer malformed input with a
//! plain-text 4xx. These wrappers turn every rejection into
//! `InvalidInput` so clients always get the JSON error body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

use crate::error::MarketError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(MarketError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(MarketError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(MarketError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for MarketError {
    fn from(rejection: JsonRejection) -> Self {
        MarketError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for MarketError {
    fn from(rejection: PathRejection) -> Self {
        MarketError::InvalidInput(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for MarketError {
    fn from(rejection: QueryRejection) -> Self {
        MarketError::InvalidInput(format!("Invalid query string: {}", rejection.body_text()))
    }
}
