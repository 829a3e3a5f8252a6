//! Integration tests for the verification workflow and HTTP API
//!
//! These tests drive the public API end to end with the fixture collaborators
//! and with mock components standing in for the model and the web.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use credo_rs::adk::error::{CredoError, FailureKind, ModelError, Result};
use credo_rs::adk::model::{Content, GenerationConfig, Model, Part};
use credo_rs::credo::config::{ComparatorKind, VerifierConfig};
use credo_rs::credo::directory::{
    Comparator, Comparison, LlmComparator, ProviderRecord, WebSource,
};
use credo_rs::credo::server::{build_router, AppState};
use credo_rs::credo::workflow::{Builder, Decision, Stage, VerificationGraph, WorkflowEvent};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that returns a fixed reply and counts calls
struct MockModel {
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl MockModel {
    fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_content(
        &self,
        history: &[Content],
        _config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(history.iter().any(|c| c.role == "user"));

        match &self.reply {
            Ok(text) => Ok(Content {
                role: "model".to_string(),
                parts: vec![Part::Text(text.clone())],
            }),
            Err(message) => Err(ModelError::Api {
                provider: "mock".to_string(),
                message: message.clone(),
            }
            .into()),
        }
    }
}

/// Web source that is always down
struct UnreachableWeb;

#[async_trait]
impl WebSource for UnreachableWeb {
    fn name(&self) -> &str {
        "unreachable web"
    }

    async fn scrape(&self, _provider_id: &str, _known: &ProviderRecord) -> Result<ProviderRecord> {
        Err(CredoError::upstream("web scraper", "connection refused"))
    }
}

/// Comparator whose score falls outside 0..=100
struct OutOfRange;

#[async_trait]
impl Comparator for OutOfRange {
    fn name(&self) -> &str {
        "out of range"
    }

    async fn compare(
        &self,
        _provider_id: &str,
        _database: &ProviderRecord,
        _scraped: &ProviderRecord,
    ) -> Result<Comparison> {
        Ok(Comparison {
            confidence_score: 150,
            discrepancies: vec![],
        })
    }
}

fn default_graph() -> VerificationGraph {
    Builder::new().build().unwrap()
}

// ============================================================================
// Workflow
// ============================================================================

#[tokio::test]
async fn test_high_confidence_provider_is_updated() {
    let state = default_graph().run("1001").await;

    assert_eq!(state.stage, Stage::Updated);
    assert_eq!(state.decision, Decision::UpdateDatabase);
    assert_eq!(state.confidence_score, Some(95));
    assert!(state.discrepancies.is_empty());
    assert_eq!(
        state.steps,
        vec![
            "fetch_provider",
            "scrape_web",
            "quality_assurance",
            "update_database"
        ]
    );
    assert_eq!(state.status_log.len(), 4);
    assert!(state.status_log[0].starts_with("[fetch_provider]"));
    assert!(state.status_log[3].starts_with("[update_database]"));
}

#[tokio::test]
async fn test_low_confidence_provider_is_flagged() {
    let state = default_graph().run("2001").await;

    assert_eq!(state.stage, Stage::Flagged);
    assert_eq!(state.decision, Decision::FlagForReview);
    assert_eq!(state.confidence_score, Some(78));
    assert_eq!(state.discrepancies.len(), 1);
    assert_eq!(state.discrepancies[0].field, "phone");
    assert_eq!(state.steps.last().unwrap(), "flag_for_review");
}

#[tokio::test]
async fn test_multiple_discrepancies_are_flagged() {
    let state = default_graph().run("3001").await;

    assert_eq!(state.decision, Decision::FlagForReview);
    assert_eq!(state.confidence_score, Some(65));
    let fields: Vec<&str> = state
        .discrepancies
        .iter()
        .map(|d| d.field.as_str())
        .collect();
    assert_eq!(fields, vec!["phone", "address"]);
}

#[tokio::test]
async fn test_every_fixture_reaches_a_decision() {
    let graph = default_graph();
    for (id, expected) in [
        ("1001", Decision::UpdateDatabase),
        ("1002", Decision::UpdateDatabase),
        ("1003", Decision::UpdateDatabase),
        ("4001", Decision::UpdateDatabase),
        ("2001", Decision::FlagForReview),
        ("2002", Decision::FlagForReview),
        ("3001", Decision::FlagForReview),
        ("3002", Decision::FlagForReview),
    ] {
        let state = graph.run(id).await;
        assert_eq!(state.decision, expected, "provider {}", id);
        assert!(state.database_record.is_some());
        assert!(state.scraped_record.is_some());
        assert!(state.failure.is_none());
    }
}

#[tokio::test]
async fn test_unknown_provider_fails_at_fetch() {
    let state = default_graph().run("9999").await;

    assert_eq!(state.stage, Stage::Failed);
    assert_eq!(state.decision, Decision::Pending);
    assert_eq!(state.steps, vec!["fetch_provider"]);
    assert!(state.database_record.is_none());
    assert!(state.confidence_score.is_none());

    let failure = state.failure.unwrap();
    assert_eq!(failure.node, "fetch_provider");
    assert_eq!(failure.kind, FailureKind::NotFound);
}

#[tokio::test]
async fn test_runs_are_independent_and_repeatable() {
    let graph = default_graph();
    let first = graph.run("2002").await;
    let second = graph.run("2002").await;

    assert_eq!(first, second);
    assert_eq!(first.confidence_score, Some(75));
}

#[tokio::test]
async fn test_scrape_outage_keeps_partial_state() {
    let graph = Builder::new()
        .with_web_source(Arc::new(UnreachableWeb))
        .build()
        .unwrap();

    let state = graph.run("1001").await;

    assert_eq!(state.stage, Stage::Failed);
    assert!(state.database_record.is_some());
    assert!(state.scraped_record.is_none());
    let failure = state.failure.unwrap();
    assert_eq!(failure.node, "scrape_web");
    assert_eq!(failure.kind, FailureKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_out_of_range_score_fails_instead_of_updating() {
    let graph = Builder::new()
        .with_comparator(Arc::new(OutOfRange))
        .build()
        .unwrap();

    let state = graph.run("1001").await;

    assert_eq!(state.stage, Stage::Failed);
    assert_eq!(state.decision, Decision::Pending);
    assert!(state.confidence_score.is_none());
    assert!(!state.steps.iter().any(|s| s == "update_database"));
    let failure = state.failure.unwrap();
    assert_eq!(failure.node, "quality_assurance");
    assert_eq!(failure.kind, FailureKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_padded_provider_id_is_normalized() {
    let state = default_graph().run(" 1001 ").await;

    assert_eq!(state.provider_id(), "1001");
    assert_eq!(state.database_record.as_ref().unwrap().id, state.provider_id());
    assert_eq!(state.decision, Decision::UpdateDatabase);
}

#[tokio::test]
async fn test_threshold_is_configurable() {
    let graph = Builder::new().with_threshold(70).unwrap().build().unwrap();
    assert_eq!(graph.run("2001").await.decision, Decision::UpdateDatabase);

    // 88 is not strictly above 88
    let graph = Builder::new().with_threshold(88).unwrap().build().unwrap();
    assert_eq!(graph.run("1003").await.decision, Decision::FlagForReview);
}

#[tokio::test]
async fn test_field_comparator_from_config() {
    let config = VerifierConfig {
        comparator: ComparatorKind::Field,
        ..VerifierConfig::default()
    };
    let graph = Builder::from_config(&config).unwrap().build().unwrap();

    let clean = graph.run("1001").await;
    assert_eq!(clean.confidence_score, Some(95));
    assert_eq!(clean.decision, Decision::UpdateDatabase);

    let two_off = graph.run("3001").await;
    assert_eq!(two_off.confidence_score, Some(60));
    assert_eq!(two_off.decision, Decision::FlagForReview);
}

#[tokio::test]
async fn test_llm_comparator_verdict_drives_routing() {
    let model = Arc::new(MockModel::replying(
        "```json\n{\"confidence_score\": 83.6, \"discrepancies\": [\
         {\"field\": \"phone\", \"db_value\": \"a\", \"scraped_value\": \"b\"}]}\n```",
    ));
    let graph = Builder::new()
        .with_comparator(Arc::new(LlmComparator::new(model.clone())))
        .build()
        .unwrap();

    let state = graph.run("2001").await;

    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.confidence_score, Some(84));
    assert_eq!(state.decision, Decision::UpdateDatabase);
    assert_eq!(state.discrepancies.len(), 1);
}

#[tokio::test]
async fn test_llm_outage_fails_quality_assurance() {
    let model = Arc::new(MockModel::failing("overloaded"));
    let graph = Builder::new()
        .with_comparator(Arc::new(LlmComparator::new(model)))
        .build()
        .unwrap();

    let state = graph.run("1001").await;

    assert_eq!(state.stage, Stage::Failed);
    assert!(state.scraped_record.is_some());
    assert!(state.confidence_score.is_none());
    let failure = state.failure.unwrap();
    assert_eq!(failure.node, "quality_assurance");
    assert_eq!(failure.kind, FailureKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_stream_reports_route_and_finish() {
    let graph = default_graph();
    let (tx, mut rx) = mpsc::channel(32);
    let state = graph.run_stream("3002", tx).await;
    assert_eq!(state.decision, Decision::FlagForReview);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let started: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::NodeStarted { node } => Some(node.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        started,
        vec![
            "fetch_provider",
            "scrape_web",
            "quality_assurance",
            "flag_for_review"
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, WorkflowEvent::Routed { node, .. } if node == "flag_for_review")));
    assert_eq!(
        events.last().unwrap(),
        &WorkflowEvent::Finished {
            stage: Stage::Flagged,
            decision: Decision::FlagForReview,
            confidence_score: Some(68),
        }
    );
}

// ============================================================================
// HTTP API
// ============================================================================

fn app() -> axum::Router {
    build_router(AppState {
        graph: Arc::new(default_graph()),
        threshold: 80,
    })
}

async fn call(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn validate(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/validate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "Provider Directory Verification API");
}

#[tokio::test]
async fn test_providers_listing() {
    let request = Request::builder()
        .uri("/api/providers")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(request).await;

    assert_eq!(status, StatusCode::OK);
    let providers = body.as_array().unwrap();
    assert_eq!(providers.len(), 8);
    let first = &providers[0];
    assert_eq!(first["id"], "1001");
    assert_eq!(first["expected_decision"], "update_database");
}

#[tokio::test]
async fn test_validate_accepts_numeric_id() {
    let (status, body) = call(validate(json!({ "provider_id": 1001 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["provider_id"], "1001");
    assert_eq!(body["decision"], "update_database");
    assert_eq!(body["confidence_score"], 95);
    assert_eq!(body["workflow_steps"].as_array().unwrap().len(), 4);
    assert!(body["run_id"].is_string());
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_validate_flagged_provider() {
    let (status, body) = call(validate(json!({ "provider_id": "2001" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stage"], "flagged");
    assert_eq!(body["decision"], "flag_for_review");
    assert_eq!(body["discrepancies"][0]["field"], "phone");
}

#[tokio::test]
async fn test_validate_unknown_provider() {
    let (status, body) = call(validate(json!({ "provider_id": "9999" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["stage"], "failed");
    assert_eq!(body["decision"], "pending");
    assert!(body["error"].as_str().unwrap().contains("9999"));
}

#[tokio::test]
async fn test_validate_rejects_blank_id() {
    let (status, body) = call(validate(json!({ "provider_id": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_validate_rejects_non_positive_id() {
    let (status, _) = call(validate(json!({ "provider_id": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn stream_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/validate/stream")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_validate_stream_emits_sse_events() {
    let response = app()
        .oneshot(stream_request(json!({ "provider_id": "2001" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let events: Vec<Value> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect();

    assert_eq!(events[0]["type"], "node_started");
    assert_eq!(events[0]["node"], "fetch_provider");
    assert!(events
        .iter()
        .any(|e| e["type"] == "routed" && e["node"] == "flag_for_review"));

    let last = events.last().unwrap();
    assert_eq!(last["type"], "finished");
    assert_eq!(last["stage"], "flagged");
    assert_eq!(last["decision"], "flag_for_review");
    assert_eq!(last["confidence_score"], 78);
}

#[tokio::test]
async fn test_validate_stream_rejects_blank_id() {
    let response = app()
        .oneshot(stream_request(json!({ "provider_id": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}
