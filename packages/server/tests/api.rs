//! Router tests against in-memory stores and the mock model.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use entity_miner::testing::{fixture_deps, responses, MockModel};
use entity_miner::{
    template_types, Category, ExtractedEntity, MinerConfig, MinerDeps, Significance,
};
use miner_server::server::{build_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn scripted_model() -> MockModel {
    let entities = [
        ExtractedEntity::new("Balasar", Category::Person, Some(Significance::Major)),
        ExtractedEntity::new("Aass-Nag", Category::Location, None),
    ];
    MockModel::new()
        .with_response(template_types::GENRE_DETERMINATION, responses::genre("High Fantasy"))
        .with_response(template_types::ENTITY_EXTRACTION, responses::entities(&entities))
        .with_response(template_types::PERSON_PROFILER, responses::person("Balasar"))
        .with_response(template_types::LOCATION_PROFILER, responses::location("Aass-Nag"))
}

fn app_with(deps: MinerDeps) -> Router {
    build_app(AppState::new(deps, MinerConfig::new("deepseek.v3-v1:0")), &[])
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn wait_for_job(app: &Router, job_id: &str) -> Value {
    for _ in 0..100 {
        let (status, job) = send(app, "GET", &format!("/api/jobs/{}", job_id), None).await;
        assert_eq!(status, StatusCode::OK);
        if job["status"] != "RUNNING" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {} did not finish", job_id);
}

#[tokio::test]
async fn test_health() {
    let app = app_with(fixture_deps(Arc::new(MockModel::new())));
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_id"], "deepseek.v3-v1:0");
}

#[tokio::test]
async fn test_mine_job_runs_to_success() {
    let app = app_with(fixture_deps(Arc::new(scripted_model())));

    let (status, accepted) = send(
        &app,
        "POST",
        "/api/mine",
        Some(json!({"text": "Balasar crossed Aass-Nag.", "novel_name": "novel1", "username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(accepted["status"], "RUNNING");

    let job = wait_for_job(&app, accepted["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "SUCCEEDED");
    assert_eq!(job["user_id"], "alice");

    let (status, similar) = send(
        &app,
        "GET",
        "/api/similar_entities?query_text=jungle%20realm&collection=alice-novel1&n_results=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(similar["entities"].as_array().unwrap().len(), 1);
    assert_eq!(similar["entities"][0]["metadata"]["novel_name"], "novel1");
}

#[tokio::test]
async fn test_mine_job_failure_is_recorded() {
    let app = app_with(fixture_deps(Arc::new(MockModel::new())));

    let (_, accepted) = send(
        &app,
        "POST",
        "/api/mine",
        Some(json!({"text": "T", "novel_name": "novel1", "username": "alice"})),
    )
    .await;

    let job = wait_for_job(&app, accepted["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "FAILED");
    assert!(job["error_message"]
        .as_str()
        .unwrap()
        .contains("genre_determination"));
}

#[tokio::test]
async fn test_mine_rejects_blank_fields() {
    let app = app_with(fixture_deps(Arc::new(MockModel::new())));
    let (status, body) = send(
        &app,
        "POST",
        "/api/mine",
        Some(json!({"text": "", "novel_name": "novel1", "username": "alice"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = app_with(fixture_deps(Arc::new(MockModel::new())));
    let uri = format!("/api/jobs/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_direct_event_returns_outcome() {
    let app = app_with(fixture_deps(Arc::new(scripted_model())));
    let (status, outcome) = send(
        &app,
        "POST",
        "/api/events",
        Some(json!({"text": "Balasar crossed Aass-Nag.", "novel_name": "novel1", "username": "alice"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "success");
    assert_eq!(outcome["num_mined_entities"], 2);
}

#[tokio::test]
async fn test_story_upload_and_download() {
    let app = app_with(fixture_deps(Arc::new(scripted_model())));

    let (status, uploaded) = send(
        &app,
        "POST",
        "/api/story",
        Some(json!({
            "text": "Balasar crossed Aass-Nag.",
            "filepath": "alice/nadarr_prologue.txt",
            "bucket_name": "stories",
            "username": "alice"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["path"], "alice/nadarr_prologue.txt");

    let job = wait_for_job(&app, uploaded["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "SUCCEEDED");
    assert_eq!(job["input_type"], "blob");

    let (status, story) = send(
        &app,
        "GET",
        "/api/story?bucket=stories&object_key=alice/nadarr_prologue.txt",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(story["content"], "Balasar crossed Aass-Nag.");

    let (status, _) = send(&app, "GET", "/api/story?bucket=stories&object_key=nope.txt", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_template_lookup() {
    let app = app_with(fixture_deps(Arc::new(MockModel::new())));

    let uri = format!("/api/templates?template_type={}", template_types::GENRE_DETERMINATION);
    let (status, template) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(template["novel_name"], "global");
    assert!(template["instruction_prompt_template"]
        .as_str()
        .unwrap()
        .contains("{text}"));

    let (status, _) = send(&app, "GET", "/api/templates?template_type=nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_entity_is_searchable() {
    let app = app_with(fixture_deps(Arc::new(MockModel::new())));

    let (status, added) = send(
        &app,
        "POST",
        "/api/entity",
        Some(json!({
            "collection": "alice-novel1",
            "entity": "Javok",
            "description": "A heavy zweihander",
            "key_relations": "Owned by Balasar",
            "history": "Forged by the clan"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(added["id"].as_str().unwrap().starts_with("Javok-"));

    let (_, similar) = send(
        &app,
        "GET",
        "/api/similar_entities?query_text=zweihander&collection=alice-novel1",
        None,
    )
    .await;
    assert_eq!(similar["entities"][0]["metadata"]["source"], "manual_entry");
}
