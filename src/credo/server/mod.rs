// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::adk::error::{CredoError, FailureKind, Result};
use crate::credo::directory::{fixtures, Discrepancy, ProviderRecord};
use crate::credo::workflow::{Decision, Stage, VerificationGraph, WorkflowState};

pub const SERVICE_NAME: &str = "Provider Directory Verification API";

#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<VerificationGraph>,
    /// Used only to label the expected outcome in the provider listing
    pub threshold: u8,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/providers", get(list_providers))
        .route("/api/validate", post(validate_provider))
        .route("/api/validate/stream", post(stream_validation))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn list_providers(State(state): State<AppState>) -> Json<Value> {
    let providers: Vec<Value> = fixtures::all()
        .map(|(id, fixture)| {
            let expected = if fixture.confidence > state.threshold {
                Decision::UpdateDatabase
            } else {
                Decision::FlagForReview
            };
            json!({
                "id": id,
                "name": fixture.database.name,
                "specialty": fixture.database.specialty,
                "city": fixture.database.city,
                "expected_decision": expected,
            })
        })
        .collect();
    Json(json!(providers))
}

/// Provider id as sent by clients: `"1001"` or `1001`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProviderIdInput {
    Text(String),
    Number(i64),
}

impl ProviderIdInput {
    /// Normalize to the string id the workflow runs on
    pub fn normalize(&self) -> Result<String> {
        let id = match self {
            ProviderIdInput::Text(s) => s.trim().to_string(),
            ProviderIdInput::Number(n) => n.to_string(),
        };
        if id.is_empty() {
            return Err(CredoError::InvalidInput("provider_id is required".into()));
        }
        if let Ok(n) = id.parse::<i64>() {
            if n <= 0 {
                return Err(CredoError::InvalidInput(format!(
                    "provider_id must be positive, got {}",
                    n
                )));
            }
        }
        Ok(id)
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub provider_id: ProviderIdInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub success: bool,
    pub run_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub provider_id: String,
    pub stage: Stage,
    pub decision: Decision,
    pub confidence_score: Option<u8>,
    pub database_record: Option<ProviderRecord>,
    pub scraped_record: Option<ProviderRecord>,
    pub discrepancies: Vec<Discrepancy>,
    pub workflow_steps: Vec<String>,
    pub status_log: Vec<String>,
    pub message: String,
    pub error: Option<String>,
}

impl VerificationResponse {
    pub fn from_state(state: WorkflowState) -> Self {
        let message = match state.stage {
            Stage::Updated => format!(
                "Provider {} verified and updated in the directory",
                state.provider_id()
            ),
            Stage::Flagged => format!(
                "Provider {} flagged for human review",
                state.provider_id()
            ),
            _ => format!("Verification of provider {} failed", state.provider_id()),
        };
        let error = state.failure.as_ref().map(|f| f.message.clone());

        Self {
            success: state.stage != Stage::Failed,
            run_id: Uuid::new_v4(),
            checked_at: Utc::now(),
            provider_id: state.provider_id().to_string(),
            stage: state.stage,
            decision: state.decision,
            confidence_score: state.confidence_score,
            database_record: state.database_record,
            scraped_record: state.scraped_record,
            discrepancies: state.discrepancies,
            workflow_steps: state.steps,
            status_log: state.status_log,
            message,
            error,
        }
    }
}

fn status_for(state: &WorkflowState) -> StatusCode {
    match &state.failure {
        None => StatusCode::OK,
        Some(failure) => match failure.kind {
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn bad_request(err: CredoError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": err.to_string() })),
    )
        .into_response()
}

async fn validate_provider(
    State(app): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> Response {
    let provider_id = match payload.provider_id.normalize() {
        Ok(id) => id,
        Err(e) => return bad_request(e),
    };

    let state = app.graph.run(&provider_id).await;
    let status = status_for(&state);
    (status, Json(VerificationResponse::from_state(state))).into_response()
}

async fn stream_validation(
    State(app): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> Response {
    let provider_id = match payload.provider_id.normalize() {
        Ok(id) => id,
        Err(e) => return bad_request(e),
    };

    let (tx, rx) = mpsc::channel(100);
    let graph = app.graph.clone();

    tokio::spawn(async move {
        log::info!("Starting streaming verification for provider {}", provider_id);
        let state = graph.run_stream(&provider_id, tx).await;
        log::info!(
            "Streaming verification for provider {} ended at {}",
            provider_id,
            state.stage.as_str()
        );
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok::<_, Infallible>(
            Event::default()
                .json_data(&event)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
        )
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
        .into_response()
}
