//! HTTP mapping for [`MarketError`]

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::error::{DenialReason, MarketError};

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl MarketError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::PolicyDenied {
                reason: DenialReason::TargetNotFound,
                ..
            } => StatusCode::NOT_FOUND,
            Self::PolicyDenied { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Unexpected(detail) => {
                // Detail stays in the log
                error!(detail = %detail, "Request failed");
                ErrorBody {
                    msg: "Internal server error".to_string(),
                    reason: None,
                    retry_after: None,
                }
            }
            Self::RateLimited { retry_after_secs } => ErrorBody {
                msg: "Too many contact requests. Please try again later.".to_string(),
                reason: None,
                retry_after: Some(*retry_after_secs),
            },
            Self::PolicyDenied { reason, message } => ErrorBody {
                msg: message.clone(),
                reason: Some(*reason),
                retry_after: None,
            },
            Self::NotFound(what) => {
                let mut chars = what.chars();
                let msg = match chars.next() {
                    Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
                    None => "Not found".to_string(),
                };
                ErrorBody {
                    msg,
                    reason: None,
                    retry_after: None,
                }
            }
            other => ErrorBody {
                msg: other.to_string(),
                reason: None,
                retry_after: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(MarketError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            MarketError::RateLimited { retry_after_secs: 3 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            MarketError::PolicyDenied {
                reason: DenialReason::TargetNotFound,
                message: "Seller not found".into(),
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MarketError::PolicyDenied {
                reason: DenialReason::ReputationTooLow,
                message: "low".into(),
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(MarketError::invalid("x").status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = MarketError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
