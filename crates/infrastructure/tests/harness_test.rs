//! End-to-end harness runs against a live local HTTP server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use axum::extract::Path as UrlPath;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gauntlet_application::RunError;
use gauntlet_infrastructure::{
    HarnessConfig, HarnessError, HarnessParams, JsonLinesSink, SubRun, SubRunStatus,
    run_with_testing,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::tempdir;
use tokio::net::TcpListener;
use url::Url;

async fn create_user(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "id": 7, "name": body["name"] })),
    )
}

async fn get_user(UrlPath(id): UrlPath<u64>) -> Result<Json<Value>, StatusCode> {
    if id == 7 {
        Ok(Json(json!({ "id": 7, "name": "ada", "created_at": "2026-01-02" })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn serve() -> Url {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn closed_port() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}")).unwrap()
}

fn statuses(sub_runs: &[SubRun]) -> Vec<(&str, SubRunStatus)> {
    sub_runs
        .iter()
        .map(|r| (r.name.as_str(), r.status))
        .collect()
}

fn write(dir: &Path, name: &str, yaml: &str) {
    fs::write(dir.join(name), yaml).unwrap();
}

const USERS: &str = r#"
- name: create_user
  request:
    method: post
    path: /users
    body: '{"name": "ada"}'
  expect:
    status: 201
    body: '{"id": "$matchRegexp(^\\d+$)", "name": "ada"}'
  capture:
    user_id: $.id
- name: get_user
  request:
    path: /users/{{ user_id }}
  expect:
    status: 200
    headers:
      content-type: $matchRegexp(^application/json)
    body: '{"id": 7, "name": "{{ expected_name }}"}'
- name: not_ready
  status: skipped
  request:
    path: /later
"#;

const MISSING: &str = "
- name: missing_user
  request:
    path: /users/8
  expect:
    status: 200
- name: health
  request:
    path: /health
  expect:
    status: 200
    body: ok
";

#[tokio::test]
async fn test_passing_suite_with_capture_and_reports() {
    let host = serve().await;
    let tests = tempdir().unwrap();
    write(tests.path(), "users.yaml", USERS);
    let out = tempdir().unwrap();
    let jsonl = out.path().join("results.jsonl");

    let mut params = HarnessParams::new(host, tests.path());
    params
        .variables
        .insert("expected_name".to_string(), "ada".to_string());
    params
        .outputs
        .push(Box::new(JsonLinesSink::create(&jsonl).unwrap()));
    let config = HarnessConfig {
        report_dir: Some(out.path().join("allure")),
        ..HarnessConfig::default()
    };

    let outcome = run_with_testing(params, config).await.unwrap();

    assert_eq!(
        statuses(&outcome.sub_runs),
        vec![
            ("create_user", SubRunStatus::Passed),
            ("get_user", SubRunStatus::Passed),
            ("not_ready", SubRunStatus::Skipped),
        ]
    );
    let summary = outcome.into_result().unwrap();
    assert_eq!((summary.total, summary.passed, summary.skipped), (3, 2, 1));

    let lines: Vec<Value> = fs::read_to_string(&jsonl)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let names: Vec<_> = lines.iter().map(|l| l["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["create_user", "get_user", "not_ready"]);

    let allure: Vec<_> = fs::read_dir(out.path().join("allure"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(allure.iter().filter(|f| f.ends_with("-result.json")).count(), 3);
    assert_eq!(allure.iter().filter(|f| f.ends_with("-container.json")).count(), 1);
}

#[tokio::test]
async fn test_failed_assertion_fails_run_and_continues() {
    let host = serve().await;
    let tests = tempdir().unwrap();
    write(tests.path(), "missing.yaml", MISSING);

    let outcome = run_with_testing(HarnessParams::new(host, tests.path()), HarnessConfig::default())
        .await
        .unwrap();

    assert_eq!(
        statuses(&outcome.sub_runs),
        vec![
            ("missing_user", SubRunStatus::Failed),
            ("health", SubRunStatus::Passed),
        ]
    );
    match outcome.into_result() {
        Err(RunError::AssertionsFailed { first, summary }) => {
            assert_eq!(first, "missing_user");
            assert_eq!((summary.failed, summary.passed), (1, 1));
        }
        other => panic!("expected assertion failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_broken() {
    let host = closed_port().await;
    let tests = tempdir().unwrap();
    write(tests.path(), "missing.yaml", MISSING);

    let outcome = run_with_testing(HarnessParams::new(host, tests.path()), HarnessConfig::default())
        .await
        .unwrap();

    assert_eq!(
        statuses(&outcome.sub_runs),
        vec![
            ("missing_user", SubRunStatus::Errored),
            ("health", SubRunStatus::Errored),
        ]
    );
    let err = outcome.into_result().unwrap_err();
    assert!(err.is_infrastructure());
    assert!(matches!(err, RunError::TestCase(_)));
}

#[tokio::test]
async fn test_file_filter_and_duplicate_names() {
    let host = serve().await;
    let tests = tempdir().unwrap();
    write(
        tests.path(),
        "health.yaml",
        "
- name: health
  request:
    path: /health
- name: health
  request:
    path: /health
",
    );
    write(tests.path(), "missing.yaml", MISSING);

    let config = HarnessConfig {
        file_filter: Some("health".to_string()),
        ..HarnessConfig::default()
    };
    let outcome = run_with_testing(HarnessParams::new(host, tests.path()), config)
        .await
        .unwrap();

    assert_eq!(
        statuses(&outcome.sub_runs),
        vec![
            ("health", SubRunStatus::Passed),
            ("health#01", SubRunStatus::Passed),
        ]
    );
    assert!(outcome.into_result().is_ok());
}

#[tokio::test]
async fn test_bad_report_dir_aborts_before_running() {
    let tests = tempdir().unwrap();
    write(tests.path(), "missing.yaml", MISSING);
    let blocker = tests.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();

    let config = HarnessConfig {
        report_dir: Some(blocker.join("allure")),
        ..HarnessConfig::default()
    };
    let result = run_with_testing(
        HarnessParams::new(closed_port().await, tests.path()),
        config,
    )
    .await;

    assert!(matches!(result, Err(HarnessError::ReportDir { .. })));
}
