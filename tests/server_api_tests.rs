mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{report_xlsx, three_sections};
use prodeff::config::Config;
use prodeff::server::router;
use tower::ServiceExt;

fn app() -> Router {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        static_dir: dir.path().join("dist"),
        ..Config::default()
    };
    router(&config)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).expect("response should be valid json"))
}

async fn upload(app: &Router, name: &str, bytes: Vec<u8>) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/reports?name={name}"))
        .body(Body::from(bytes))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).expect("response should be valid json"))
}

#[tokio::test]
async fn health_endpoint_returns_ok_json() {
    let (status, payload) = get_json(&app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["service"], "prodeff-api");
}

#[tokio::test]
async fn upload_appends_to_session_dataset() {
    let app = app();
    let (status, payload) = upload(&app, "novembre.xlsx", report_xlsx(&three_sections("2025/11")).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["file"], "novembre.xlsx");
    assert_eq!(payload["records_added"], 3);
    assert_eq!(payload["strategy"], "width");
    assert_eq!(payload["total_records"], 3);

    let (_, payload) = upload(&app, "decembre.xlsx", report_xlsx(&three_sections("2025/12")).unwrap()).await;
    assert_eq!(payload["total_records"], 6);

    let (status, payload) = get_json(&app, "/api/dataset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["total"], 6);
    assert_eq!(payload["showing"], 6);
    assert_eq!(payload["records"][0]["Matricule"], "7001");
    assert_eq!(payload["records"][3]["Source_File"], "decembre.xlsx");

    let (_, payload) = get_json(&app, "/api/dataset?period=2025/12&min_efficiency=0.9").await;
    assert_eq!(payload["showing"], 1);
    assert_eq!(payload["total"], 6);
}

#[tokio::test]
async fn unreadable_upload_is_422_and_session_is_unchanged() {
    let app = app();
    let (status, payload) = upload(&app, "broken.xls", b"garbage".to_vec()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(payload["status"], "error");
    assert!(payload["message"].as_str().unwrap().contains("broken.xls"));

    let (_, payload) = get_json(&app, "/api/dataset").await;
    assert_eq!(payload["total"], 0);
}

#[tokio::test]
async fn upload_without_name_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/reports")
        .body(Body::from(vec![1, 2, 3]))
        .unwrap();
    let (status, _) = send(&app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summary_top_and_search_reflect_uploads() {
    let app = app();
    upload(&app, "decembre.xlsx", report_xlsx(&three_sections("2025/12")).unwrap()).await;

    let (_, summary) = get_json(&app, "/api/summary").await;
    assert_eq!(summary["metrics"]["record_count"], 3);
    assert_eq!(summary["metrics"]["period_count"], 2);
    assert_eq!(summary["periods"][0]["period"], "2025/12");
    assert!(summary["generated_at"].is_string());

    let (_, top) = get_json(&app, "/api/top?n=1").await;
    let top = top["top"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["Matricule"], "9040");

    let (status, _) = get_json(&app, "/api/top?n=many").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, search) = get_json(&app, "/api/search?q=benali").await;
    assert_eq!(search["count"], 1);
    assert_eq!(search["results"][0]["Employee_Name"], "BENALI Karim");
    assert_eq!(search["results"][0]["band"], "near_target");
}

#[tokio::test]
async fn exports_are_attachments() {
    let app = app();
    upload(&app, "decembre.xlsx", report_xlsx(&three_sections("2025/12")).unwrap()).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/export.csv").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"cleaned_efficiency_data.csv\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.starts_with("Matricule,Employee_Name,Period"));

    let request = Request::builder().uri("/api/export.xlsx").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with(b"PK"));
}

#[tokio::test]
async fn export_snapshots_records_while_uploads_continue() {
    let app = app();
    upload(&app, "decembre.xlsx", report_xlsx(&three_sections("2025/12")).unwrap()).await;

    let export = || Request::builder().uri("/api/export.xlsx").body(Body::empty()).unwrap();
    let xls = include_bytes!("fixtures/compact_report.xls").to_vec();
    let ((xlsx_status, xlsx), (csv_status, _), (upload_status, payload)) = tokio::join!(
        send(&app, export()),
        send(&app, Request::builder().uri("/api/export.csv").body(Body::empty()).unwrap()),
        upload(&app, "compact_report.xls", xls),
    );
    assert_eq!(xlsx_status, StatusCode::OK);
    assert!(xlsx.starts_with(b"PK"));
    assert_eq!(csv_status, StatusCode::OK);
    assert_eq!(upload_status, StatusCode::OK);
    assert_eq!(payload["records_added"], 2);
    assert_eq!(payload["total_records"], 5);

    let request = Request::builder().uri("/api/export.csv").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap().lines().count(), 6);
}

#[tokio::test]
async fn delete_resets_the_session() {
    let app = app();
    upload(&app, "decembre.xlsx", report_xlsx(&three_sections("2025/12")).unwrap()).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/dataset")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(payload["cleared"], 3);

    let (_, payload) = get_json(&app, "/api/dataset").await;
    assert_eq!(payload["total"], 0);
    let (_, payload) = get_json(&app, "/api/reports").await;
    assert_eq!(payload["files"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn unknown_path_without_dashboard_is_404() {
    let (status, payload) = get_json(&app(), "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["status"], "error");
}
