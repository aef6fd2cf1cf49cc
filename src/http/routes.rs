//! REST endpoints for the triage pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::error::{Error, MailActionError};
use crate::http::html::render_triage_page;
use crate::pipeline::TriageEngine;

/// Shared state for triage routes.
#[derive(Clone)]
pub struct TriageRouteState {
    pub engine: Arc<TriageEngine>,
}

/// Only the literal string `"true"` turns the refresh flag on.
fn refresh_requested(params: &HashMap<String, String>) -> bool {
    params.get("refresh").is_some_and(|v| v == "true")
}

/// GET /analyze-emails[?refresh=true]
///
/// Runs a triage pass and returns the full `TriageOutput` as JSON.
async fn analyze_emails(
    State(state): State<TriageRouteState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    match state.engine.triage(refresh_requested(&params)).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

/// GET /analyze-emails/html[?refresh=true]
///
/// Same logic as the JSON trigger, rendered as an HTML table with
/// per-row delete actions.
async fn analyze_emails_html(
    State(state): State<TriageRouteState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    match state.engine.triage(refresh_requested(&params)).await {
        Ok(output) => Html(render_triage_page(&output)).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

/// POST /delete/{id}
///
/// Trashes the message and scrubs it from both cache slots.
async fn delete_email(
    State(state): State<TriageRouteState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.delete_email(&id).await {
        Ok(()) => Json(serde_json::json!({
            "message": format!("Email {id} moved to trash")
        }))
        .into_response(),
        Err(e) => {
            let status = match &e {
                MailActionError::NotFound { .. } => StatusCode::NOT_FOUND,
                MailActionError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(serde_json::json!({
                    "error": "Failed to delete email",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Map pipeline errors to a 500 carrying the cause chain in the message.
fn pipeline_error_response(error: Error) -> axum::response::Response {
    tracing::error!(error = %error, "Triage request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "Email analysis failed",
            "details": error.to_string(),
        })),
    )
        .into_response()
}

/// Build the triage REST routes.
pub fn triage_routes(state: TriageRouteState) -> Router {
    Router::new()
        .route("/analyze-emails", get(analyze_emails))
        .route("/analyze-emails/html", get(analyze_emails_html))
        .route("/delete/{id}", post(delete_email))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
