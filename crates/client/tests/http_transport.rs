//! `JenkinsHttp` against a small axum server speaking the Jenkins JSON API

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;

use jobtree_client::{BuildResult, FolderPath, JenkinsHttp, JobApi, JobRef, JobTransport};
use jobtree_common::{Credentials, Error, ServerConfig};

#[derive(Debug, Clone)]
struct CreatedItem {
    scope: String,
    name: String,
    content_type: String,
    authorization: Option<String>,
    body: String,
}

#[derive(Default)]
struct Recorded {
    created: Vec<CreatedItem>,
    stopped: Vec<u32>,
    triggered: Vec<String>,
}

#[derive(Clone)]
struct AppState {
    base: String,
    recorded: Arc<Mutex<Recorded>>,
}

async fn top_job(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if name == "teamA" {
        return Json(json!({
            "_class": "com.cloudbees.hudson.plugins.folder.Folder",
            "name": "teamA",
            "jobs": [{"name": "build"}, {"name": "deploy"}]
        }))
        .into_response();
    }

    let created = state
        .recorded
        .lock()
        .created
        .iter()
        .any(|item| item.scope.is_empty() && item.name == name);
    if created {
        Json(json!({"name": name, "jobs": []})).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn nested_job(State(state): State<AppState>, Path((folder, name)): Path<(String, String)>) -> Response {
    if folder != "teamA" || name != "build" {
        return StatusCode::NOT_FOUND.into_response();
    }
    let job_url = format!("{}job/teamA/job/build/", state.base);
    Json(json!({
        "_class": "org.jenkinsci.plugins.workflow.job.WorkflowJob",
        "name": "build",
        "builds": [
            {"number": 2, "url": format!("{job_url}2/")},
            {"number": 1, "url": format!("{job_url}1/")}
        ]
    }))
    .into_response()
}

async fn build_details(Path((_folder, _name, number)): Path<(String, String, u32)>) -> Response {
    match number {
        1 => Json(json!({"result": "SUCCESS", "building": false})).into_response(),
        2 => Json(json!({"result": null, "building": true})).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn stop_build(
    State(state): State<AppState>,
    Path((_folder, _name, number)): Path<(String, String, u32)>,
) -> StatusCode {
    state.recorded.lock().stopped.push(number);
    StatusCode::OK
}

async fn trigger(State(state): State<AppState>, Path((folder, name)): Path<(String, String)>) -> StatusCode {
    state.recorded.lock().triggered.push(format!("{folder}/{name}"));
    StatusCode::CREATED
}

async fn delete_top(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "ghost" => StatusCode::NOT_FOUND.into_response(),
        "locked" => (StatusCode::FORBIDDEN, "Access Denied").into_response(),
        _ => StatusCode::OK.into_response(),
    }
}

fn record_creation(state: &AppState, scope: &str, query: &HashMap<String, String>, headers: &HeaderMap, body: String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.recorded.lock().created.push(CreatedItem {
        scope: scope.to_string(),
        name: query.get("name").cloned().unwrap_or_default(),
        content_type: header("content-type").unwrap_or_default(),
        authorization: header("authorization"),
        body,
    });
}

async fn create_top(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    record_creation(&state, "", &query, &headers, body);
    StatusCode::OK
}

async fn create_in_folder(
    State(state): State<AppState>,
    Path(folder): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    record_creation(&state, &folder, &query, &headers, body);
    StatusCode::OK
}

async fn spawn_server() -> (String, Arc<Mutex<Recorded>>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let state = AppState {
        base: base.clone(),
        recorded: recorded.clone(),
    };

    let app = Router::new()
        .route("/createItem", post(create_top))
        .route("/job/:folder/api/json", get(top_job))
        .route("/job/:folder/doDelete", post(delete_top))
        .route("/job/:folder/createItem", post(create_in_folder))
        .route("/job/:folder/job/:name/api/json", get(nested_job))
        .route("/job/:folder/job/:name/build", post(trigger))
        .route("/job/:folder/job/:name/:number/api/json", get(build_details))
        .route("/job/:folder/job/:name/:number/stop", post(stop_build))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, recorded)
}

fn config(base: &str) -> ServerConfig {
    ServerConfig {
        base_url: base.to_string(),
        credentials: Some(Credentials::new("admin", "token")),
        ..Default::default()
    }
}

#[tokio::test]
async fn lookup_folder_view_and_builds() {
    let (base, recorded) = spawn_server().await;
    let http = JenkinsHttp::new(&config(&base)).unwrap();

    assert!(http.get_job(None, "missing").await.unwrap().is_none());

    let team = http.get_job(None, "teamA").await.unwrap().expect("teamA exists");
    let view = http.folder_view(&team).await.unwrap().expect("teamA is a folder");
    assert_eq!(view.handle.url(), format!("{base}job/teamA/"));
    assert_eq!(view.jobs, vec!["build".to_string(), "deploy".to_string()]);

    let job = JobRef::new(Some(view.handle.clone()), "build");
    assert!(http.folder_view(&job).await.unwrap().is_none());

    let builds = http.list_builds(&job).await.unwrap();
    assert_eq!(builds.iter().map(|b| b.number).collect::<Vec<_>>(), vec![2, 1]);
    assert_eq!(http.build_result(&builds[0]).await.unwrap(), None);
    assert_eq!(
        http.build_result(&builds[1]).await.unwrap(),
        Some(BuildResult::Success)
    );

    http.stop_build(&builds[0]).await.unwrap();
    assert_eq!(recorded.lock().stopped, vec![2]);
}

#[tokio::test]
async fn delete_maps_status_codes() {
    let (base, _) = spawn_server().await;
    let http = JenkinsHttp::new(&config(&base)).unwrap();

    http.delete_job(None, "old").await.unwrap();

    let err = http.delete_job(None, "ghost").await.unwrap_err();
    assert!(err.is_not_found());

    let err = http.delete_job(None, "locked").await.unwrap_err();
    match err {
        Error::Transport { status, message } => {
            assert_eq!(status, Some(403));
            assert!(message.contains("Access Denied"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn api_over_http_creates_folders_and_jobs() {
    let (base, recorded) = spawn_server().await;
    let api = JobApi::connect(&config(&base)).unwrap();

    let folder = api
        .lifecycle()
        .create_folder_chain(&FolderPath::parse("teamB").unwrap(), false)
        .await
        .unwrap();
    assert_eq!(folder.url(), format!("{base}job/teamB/"));

    api.lifecycle()
        .create_pipeline(Some(&folder), "build", "echo ok")
        .await
        .unwrap();

    let created = recorded.lock().created.clone();
    assert_eq!(created.len(), 2);

    let folder_item = &created[0];
    assert_eq!(folder_item.scope, "");
    assert_eq!(folder_item.name, "teamB");
    assert_eq!(folder_item.content_type, "text/xml");
    assert!(folder_item
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Basic ")));
    assert!(folder_item.body.contains("com.cloudbees.hudson.plugins.folder.Folder"));

    let job_item = &created[1];
    assert_eq!(job_item.scope, "teamB");
    assert_eq!(job_item.name, "build");
    assert_eq!(job_item.content_type, "application/xml");
    assert!(job_item.body.contains("<script>echo ok</script>"));
}

#[tokio::test]
async fn api_over_http_triggers_and_reads_results() {
    let (base, recorded) = spawn_server().await;
    let api = JobApi::connect(&config(&base)).unwrap();
    let team = FolderPath::parse("teamA").unwrap();

    api.builds().build(&team, "build").await.unwrap();
    assert_eq!(recorded.lock().triggered, vec!["teamA/build".to_string()]);

    // build #2 is the latest and still running
    assert_eq!(api.builds().last_build_result(&team, "build").await.unwrap(), None);

    let stopped = api.builds().abort_all_builds(&team, "build").await.unwrap();
    assert_eq!(stopped, 1);
    assert_eq!(recorded.lock().stopped, vec![2]);
}
