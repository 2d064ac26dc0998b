use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use super::*;
use crate::model::{GenerationRequest, Platform};

// =============================================================================
// In-process fake service
// =============================================================================

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, HashMap<String, String>, Value)>>>,
}

impl Recorded {
    fn push(&self, path: &str, query: HashMap<String, String>, body: Value) {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_owned(), query, body));
    }

    fn take(&self) -> Vec<(String, HashMap<String, String>, Value)> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }
}

async fn generate_ok(
    State(rec): State<Recorded>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.push("/api/v1/content/generate", query, body);
    Json(json!({
        "job_id": "6f9619ff-8b86-d011-b42d-00c04fc964ff",
        "status": "completed",
        "progress": 100,
        "result": {
            "id": "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            "quality_score": 8,
            "final_content": "AI is reshaping care delivery.",
            "critique_notes": "Clear and on-brand."
        }
    }))
}

async fn history_ok(State(rec): State<Recorded>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    rec.push("/api/v1/content/history", query, Value::Null);
    Json(json!({
        "total": 2,
        "page": 1,
        "page_size": 10,
        "items": [
            {
                "id": "00000000-0000-0000-0000-000000000002",
                "platform": "Twitter",
                "topic": "Web3",
                "final_content": "gm",
                "quality_score": 6.5,
                "created_at": "2025-03-01T10:00:00"
            },
            {
                "id": "00000000-0000-0000-0000-000000000001",
                "platform": "LinkedIn",
                "topic": "AI in Healthcare",
                "final_content": "AI is reshaping care delivery.",
                "quality_score": 8.0,
                "created_at": "2025-02-28T09:00:00"
            }
        ]
    }))
}

async fn unavailable() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "detail": "database offline" })))
}

async fn internal_error() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn not_json() -> &'static str {
    "<html>hello</html>"
}

async fn slack_test(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "success": true, "message": body["message"] }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str) -> HttpServiceClient {
    let config = DashboardConfig::default().with_base_url(base_url).unwrap();
    HttpServiceClient::new(&config).unwrap()
}

fn healthy_app(rec: Recorded) -> Router {
    Router::new()
        .route("/api/v1/content/generate", post(generate_ok))
        .route("/api/v1/content/history", get(history_ok))
        .route("/api/v1/metrics/slack-test", post(slack_test))
        .route("/health", get(health))
        .with_state(rec)
}

// =============================================================================
// ContentService
// =============================================================================

#[tokio::test]
async fn generate_posts_sync_single_variation() {
    let rec = Recorded::default();
    let base = spawn(healthy_app(rec.clone())).await;
    let client = client_for(&base);

    let req = GenerationRequest::new("AI in Healthcare", Platform::LinkedIn, "B2B SaaS tool");
    let result = client.generate(&GenerateBody::single(&req)).await.unwrap();

    assert_eq!(result.status, "completed");
    assert_eq!(result.quality_score, Some(8.0));

    let requests = rec.take();
    assert_eq!(requests.len(), 1);
    let (path, query, body) = &requests[0];
    assert_eq!(path, "/api/v1/content/generate");
    assert_eq!(query.get("use_async").map(String::as_str), Some("false"));
    assert_eq!(body["product_info"], "B2B SaaS tool");
    assert_eq!(body["platform"], "LinkedIn");
    assert_eq!(body["num_variations"], 1);
}

#[tokio::test]
async fn history_default_query_sends_no_params() {
    let rec = Recorded::default();
    let base = spawn(healthy_app(rec.clone())).await;
    let client = client_for(&base);

    let page = client.history(&HistoryQuery::default()).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].topic, "Web3");

    let requests = rec.take();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].1.is_empty());
}

#[tokio::test]
async fn history_forwards_filters() {
    let rec = Recorded::default();
    let base = spawn(healthy_app(rec.clone())).await;
    let client = client_for(&base);

    let query = HistoryQuery { page: Some(2), page_size: Some(5), platform: Some(Platform::Twitter) };
    client.history(&query).await.unwrap();

    let requests = rec.take();
    let params = &requests[0].1;
    assert_eq!(params.get("page").map(String::as_str), Some("2"));
    assert_eq!(params.get("page_size").map(String::as_str), Some("5"));
    assert_eq!(params.get("platform").map(String::as_str), Some("Twitter"));
}

#[tokio::test]
async fn non_success_maps_to_remote_with_status_text_and_detail() {
    let app = Router::new().route("/api/v1/content/history", get(unavailable));
    let client = client_for(&spawn(app).await);

    let err = client.history(&HistoryQuery::default()).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Remote { status: 503, message: "API Error: Service Unavailable (database offline)".into() }
    );
}

#[tokio::test]
async fn non_json_error_body_uses_status_text_only() {
    let app = Router::new().route("/api/v1/content/generate", post(internal_error));
    let client = client_for(&spawn(app).await);

    let req = GenerationRequest::new("AI", Platform::Facebook, "tool");
    let err = client.generate(&GenerateBody::single(&req)).await.unwrap_err();
    assert_eq!(err.to_string(), "API Error: Internal Server Error");
}

#[tokio::test]
async fn undecodable_success_body_is_decode_error() {
    let app = Router::new().route("/api/v1/content/history", get(not_json));
    let client = client_for(&spawn(app).await);

    let err = client.history(&HistoryQuery::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"));
    let err = client.history(&HistoryQuery::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

// =============================================================================
// InsightsService
// =============================================================================

#[tokio::test]
async fn slack_test_posts_message() {
    let client = client_for(&spawn(healthy_app(Recorded::default())).await);
    let ack = client.send_slack_test("hello ops").await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.message, "hello ops");
}

#[tokio::test]
async fn health_reads_status() {
    let client = client_for(&spawn(healthy_app(Recorded::default())).await);
    assert_eq!(client.health().await.unwrap().status, "ok");
}
