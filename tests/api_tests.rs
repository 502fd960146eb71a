//! HTTP API tests
//!
//! Requests go through the full router (auth, admin guard, security headers,
//! body limits) backed by the in-memory store.

use agri_market::api::{AppState, SecurityMiddlewareConfig, TokenVerifier, create_router};
use agri_market::access::{PolicyConfig, SlidingWindowLimiter};
use agri_market::models::{Actor, Role};
use agri_market::store::{ActorStore, MemoryStore};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "api-test-secret-of-at-least-32-characters";

// ============================================================================
// Test Helpers
// ============================================================================

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    tokens: Arc<TokenVerifier>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenVerifier::new(SECRET));
        let state = AppState::new(
            store.clone(),
            Arc::new(SlidingWindowLimiter::default()),
            PolicyConfig::default(),
            tokens.clone(),
            SecurityMiddlewareConfig {
                max_request_size: 4 * 1024,
                log_requests: false,
                sanitize_logs: true,
            },
        );
        Self {
            router: create_router(state),
            store,
            tokens,
        }
    }

    async fn add(&self, actor: Actor) -> (Actor, String) {
        self.store.insert_actor(&actor).await.unwrap();
        let token = self
            .tokens
            .issue(actor.id, chrono::Duration::hours(1))
            .unwrap();
        (actor, token)
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, "api-test")
            .header("x-forwarded-for", "198.51.100.23");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes.to_vec())
    }

    async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

fn seller() -> Actor {
    Actor::new("Hill Farm", Role::Seller)
        .with_phone("0711000000")
        .with_location("Meru")
}

fn buyer(score: i32) -> Actor {
    Actor::new("City Market", Role::Buyer)
        .with_email("city@example.com", true)
        .with_trust_score(score)
}

// ============================================================================
// Health and Authentication
// ============================================================================

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new();
        let (status, headers, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    }

    #[tokio::test]
    async fn test_missing_and_bad_tokens_rejected() {
        let app = TestApp::new();
        let (seller, _) = app.add(seller()).await;
        let uri = format!("/api/contact/{}", seller.id);

        let (status, body) = app.json("GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["msg"].is_string());

        let (status, _) = app.json("GET", &uri, Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Valid signature, unknown actor
        let stranger = app
            .tokens
            .issue(uuid::Uuid::new_v4(), chrono::Duration::hours(1))
            .unwrap();
        let (status, _) = app.json("GET", &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin() {
        let app = TestApp::new();
        let (_, buyer_token) = app.add(buyer(90)).await;
        let (_, admin_token) = app.add(Actor::new("Ops", Role::Administrator)).await;

        let (status, _) = app.json("GET", "/api/admin/stats", Some(&buyer_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.json("GET", "/api/admin/stats", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"]["total"], 2);
        assert_eq!(body["users"]["buyers"], 1);
    }
}

// ============================================================================
// Contact Disclosure
// ============================================================================

mod contact {
    use super::*;

    #[tokio::test]
    async fn test_disclosure_and_audit_trail() {
        let app = TestApp::new();
        let (seller, _) = app.add(seller()).await;
        let (buyer, buyer_token) = app.add(buyer(25)).await;
        let (_, admin_token) = app.add(Actor::new("Ops", Role::Administrator)).await;

        let uri = format!("/api/contact/{}", seller.id);
        let (status, headers, bytes) = app.send("GET", &uri, Some(&buyer_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-store, no-cache, must-revalidate"
        );
        let card: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(card["name"], "Hill Farm");
        assert_eq!(card["phone"], "0711000000");
        assert_eq!(card["location"], "Meru");

        let (status, logs) = app
            .json("GET", "/api/admin/disclosures", Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logs["total"], 1);
        assert_eq!(logs["items"][0]["buyer"]["id"], buyer.id.to_string());
        assert_eq!(logs["items"][0]["origin"], "198.51.100.23");
        assert_eq!(logs["items"][0]["agent"], "api-test");

        let other = format!("/api/admin/disclosures?buyerId={}", uuid::Uuid::new_v4());
        let (status, filtered) = app.json("GET", &other, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(filtered["total"], 0);
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429_with_retry_after() {
        let app = TestApp::new();
        let (seller, _) = app.add(seller()).await;
        let (_, token) = app.add(buyer(60)).await;
        let uri = format!("/api/contact/{}", seller.id);

        for _ in 0..10 {
            let (status, _) = app.json("GET", &uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, headers, bytes) = app.send("GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let retry: u64 = headers
            .get(header::RETRY_AFTER)
            .unwrap()
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(retry > 0 && retry <= 60);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["retry_after"], retry);
    }

    #[tokio::test]
    async fn test_policy_denials_carry_reason() {
        let app = TestApp::new();
        let (seller, _) = app.add(seller()).await;
        let (_, low_token) = app.add(buyer(15)).await;

        let uri = format!("/api/contact/{}", seller.id);
        let (status, body) = app.json("GET", &uri, Some(&low_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "ReputationTooLow");

        let missing = format!("/api/contact/{}", uuid::Uuid::new_v4());
        let (_, ok_token) = app.add(buyer(90)).await;
        let (status, body) = app.json("GET", &missing, Some(&ok_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["reason"], "TargetNotFound");
    }
}

// ============================================================================
// Reports and Moderation
// ============================================================================

mod moderation {
    use super::*;

    #[tokio::test]
    async fn test_file_and_review_report() {
        let app = TestApp::new();
        let (seller, seller_token) = app.add(seller()).await;
        let (buyer, _) = app.add(buyer(70)).await;
        let (_, admin_token) = app.add(Actor::new("Ops", Role::Administrator)).await;

        let (status, filed) = app
            .json(
                "POST",
                "/api/reports",
                Some(&seller_token),
                Some(json!({ "reported_id": buyer.id, "reason": "harassment" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(filed["report"]["status"], "pending");
        let report_id = filed["report"]["id"].as_str().unwrap().to_string();

        let (status, mine) = app.json("GET", "/api/reports/mine", Some(&seller_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);

        let (status, pending) = app
            .json("GET", "/api/admin/reports", Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending["total"], 1);

        let review_uri = format!("/api/admin/reports/{}/review", report_id);
        let (status, reviewed) = app
            .json(
                "PATCH",
                &review_uri,
                Some(&admin_token),
                Some(json!({ "status": "resolved", "action": "blocked" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reviewed["report"]["status"], "resolved");
        assert_eq!(reviewed["report"]["action"], "blocked");
        assert_eq!(reviewed["subject"]["is_blocked"], true);
        assert_eq!(reviewed["subject"]["trust_score"], 70);

        let (status, _) = app
            .json(
                "PATCH",
                &review_uri,
                Some(&admin_token),
                Some(json!({ "status": "dismissed" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, pending) = app
            .json("GET", "/api/admin/reports", Some(&admin_token), None)
            .await;
        assert_eq!(pending["total"], 0);
        let (_, all) = app
            .json("GET", "/api/admin/reports?status=all", Some(&admin_token), None)
            .await;
        assert_eq!(all["total"], 1);
    }

    #[tokio::test]
    async fn test_self_report_is_bad_request() {
        let app = TestApp::new();
        let (buyer, token) = app.add(buyer(70)).await;

        let (status, body) = app
            .json(
                "POST",
                "/api/reports",
                Some(&token),
                Some(json!({ "reported_id": buyer.id, "reason": "spam" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "You cannot report yourself");
    }

    #[tokio::test]
    async fn test_admin_block_and_reputation() {
        let app = TestApp::new();
        let (buyer, _) = app.add(buyer(70)).await;
        let (_, admin_token) = app.add(Actor::new("Ops", Role::Administrator)).await;

        let block_uri = format!("/api/admin/users/{}/block", buyer.id);
        let (status, body) = app
            .json(
                "PATCH",
                &block_uri,
                Some(&admin_token),
                Some(json!({ "blocked": true, "reason": "spam" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["is_blocked"], true);

        let (_, blocked) = app
            .json("GET", "/api/admin/users?blocked=true", Some(&admin_token), None)
            .await;
        assert_eq!(blocked["total"], 1);

        let (status, body) = app
            .json(
                "PATCH",
                &block_uri,
                Some(&admin_token),
                Some(json!({ "blocked": false })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["is_blocked"], false);

        let rep_uri = format!("/api/admin/users/{}/reputation", buyer.id);
        let (status, body) = app
            .json("PATCH", &rep_uri, Some(&admin_token), Some(json!({ "reputation": 101 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "Reputation must be between 0 and 100");

        let (status, body) = app
            .json("PATCH", &rep_uri, Some(&admin_token), Some(json!({ "reputation": 40 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["trust_score"], 40);
    }

    #[tokio::test]
    async fn test_csv_export() {
        let app = TestApp::new();
        let (seller, _) = app.add(seller()).await;
        let (_, buyer_token) = app.add(buyer(90)).await;
        let (_, admin_token) = app.add(Actor::new("Ops", Role::Administrator)).await;

        let uri = format!("/api/contact/{}", seller.id);
        app.json("GET", &uri, Some(&buyer_token), None).await;

        let (status, headers, bytes) = app
            .send("GET", "/api/admin/disclosures/export", Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let disposition = headers.get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"disclosure-events-"));

        let csv = String::from_utf8(bytes).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Buyer Name,Buyer Email,Buyer Phone,Seller Name,Seller Email,Seller Phone,Origin,Agent"
        );
        assert!(lines.next().unwrap().contains("City Market,city@example.com,,Hill Farm,,0711000000,198.51.100.23,api-test"));
    }
}

// ============================================================================
// Malformed Input
// ============================================================================

mod malformed_input {
    use super::*;

    #[tokio::test]
    async fn test_bad_uuid_in_body_is_json_400() {
        let app = TestApp::new();
        let (_, token) = app.add(buyer(70)).await;

        let (status, headers, bytes) = app
            .send(
                "POST",
                "/api/reports",
                Some(&token),
                Some(json!({ "reported_id": "not-a-uuid", "reason": "spam" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["msg"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_bad_uuid_in_path_is_json_400() {
        let app = TestApp::new();
        let (_, token) = app.add(buyer(70)).await;

        let (status, body) = app.json("GET", "/api/contact/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().starts_with("Invalid path parameter"));
    }

    #[tokio::test]
    async fn test_wrong_typed_fields_are_json_400() {
        let app = TestApp::new();
        let (buyer, _) = app.add(buyer(70)).await;
        let (_, admin_token) = app.add(Actor::new("Ops", Role::Administrator)).await;

        let rep_uri = format!("/api/admin/users/{}/reputation", buyer.id);
        let (status, body) = app
            .json("PATCH", &rep_uri, Some(&admin_token), Some(json!({ "reputation": 150.5 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].is_string());

        let review_uri = format!("/api/admin/reports/{}/review", uuid::Uuid::new_v4());
        let (status, body) = app
            .json("PATCH", &review_uri, Some(&admin_token), Some(json!({ "action": "blocked" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].is_string());

        let (status, _) = app
            .json("GET", "/api/admin/users?blocked=maybe", Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_out_of_range_audit_window_is_400() {
        let app = TestApp::new();
        let (_, admin_token) = app.add(Actor::new("Ops", Role::Administrator)).await;

        let (status, body) = app
            .json("GET", "/api/admin/disclosures?days=100000000", Some(&admin_token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("days"));

        let (status, _) = app
            .json(
                "GET",
                "/api/admin/disclosures/export?days=100000000",
                Some(&admin_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Settings
// ============================================================================

mod settings {
    use super::*;

    #[tokio::test]
    async fn test_seller_opt_out_blocks_disclosure() {
        let app = TestApp::new();
        let (seller, seller_token) = app.add(seller()).await;
        let (_, buyer_token) = app.add(buyer(90)).await;

        let (status, body) = app
            .json(
                "PATCH",
                "/api/settings/contact-sharing",
                Some(&seller_token),
                Some(json!({ "allow_contact_sharing": false })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["allow_contact_sharing"], false);

        let (_, view) = app.json("GET", "/api/settings", Some(&seller_token), None).await;
        assert_eq!(view["allow_contact_sharing"], false);
        assert_eq!(view["role"], "seller");

        let uri = format!("/api/contact/{}", seller.id);
        let (status, body) = app.json("GET", &uri, Some(&buyer_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "DisclosureDisabledByTarget");
    }

    #[tokio::test]
    async fn test_buyer_cannot_change_sharing() {
        let app = TestApp::new();
        let (_, buyer_token) = app.add(buyer(90)).await;

        let (status, _) = app
            .json(
                "PATCH",
                "/api/settings/contact-sharing",
                Some(&buyer_token),
                Some(json!({ "allow_contact_sharing": false })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let app = TestApp::new();
        let (_, token) = app.add(buyer(90)).await;
        let padding = "x".repeat(8 * 1024);

        let request = Request::builder()
            .method("POST")
            .uri("/api/reports")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, padding.len() + 2)
            .body(Body::from(format!("\"{}\"", padding)))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
