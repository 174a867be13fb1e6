use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use masslog::admin::AdminClient;
use masslog::config::Config;
use masslog::server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer) -> Router {
    let config = Config::new(&server.uri(), "anon").with_service_role_key("service");
    router(Arc::new(AppState {
        admin: AdminClient::new(&config).expect("admin"),
    }))
}

fn delete_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/delete-account")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn delete_account_requires_user_id() {
    let server = MockServer::start().await;
    let app = app(&server);

    for body in ["{}", r#"{"user_id": ""}"#, r#"{"user_id": null}"#] {
        let resp = app.clone().oneshot(delete_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json_body(resp).await, json!({"error": "User ID required"}));
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_body_is_an_internal_error() {
    let server = MockServer::start().await;
    let resp = app(&server)
        .oneshot(delete_request("not json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await, json!({"error": "Internal server error"}));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_account_removes_rows_then_user() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/weights"))
        .and(query_param("user_id", "eq.u1"))
        .and(header("authorization", "Bearer service"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.u1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/auth/v1/admin/users/u1"))
        .and(header("apikey", "service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(delete_request(r#"{"user_id": "u1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({"success": true}));
}

#[tokio::test]
async fn row_cleanup_failures_do_not_block_user_deletion() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/weights"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/auth/v1/admin/users/u1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(delete_request(r#"{"user_id": "u1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_user_deletion_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/weights"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/auth/v1/admin/users/u1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("User not found"))
        .mount(&server)
        .await;

    let resp = app(&server)
        .oneshot(delete_request(r#"{"user_id": "u1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(resp).await,
        json!({"error": "Failed to delete user account"})
    );
}

#[tokio::test]
async fn health_is_ok() {
    let server = MockServer::start().await;
    let resp = app(&server)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn admin_client_needs_service_role_key() {
    let config = Config::new("http://localhost:54321", "anon");
    assert!(AdminClient::new(&config).is_err());
}
