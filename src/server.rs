//! HTTP routes that need the service role key and so cannot run in the browser.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::admin::AdminClient;

pub struct AppState {
    pub admin: AdminClient,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/delete-account", post(delete_account))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Deletes whichever user id it is given. The caller's identity is not
/// checked here, so this route must only be reachable through infrastructure
/// that has already authenticated the request.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteAccountRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            error!(error = %rejection, "unreadable delete-account body");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };
    let user_id = req.user_id.filter(|id| !id.trim().is_empty());
    let Some(user_id) = user_id else {
        return error_response(StatusCode::BAD_REQUEST, "User ID required");
    };

    match state.admin.delete_account(&user_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(e) => {
            error!(%user_id, error = %e, "account deletion failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete user account")
        }
    }
}
