use std::sync::{Arc, Mutex, MutexGuard};

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{Config, Targets};
use crate::dataset::export::{export_bytes, ExportFormat};
use crate::dataset::Dataset;
use crate::parallel::FileSummary;
use crate::report::extract_report;
use crate::server::api;
use crate::server::static_files;

pub struct HttpResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub attachment: Option<&'static str>,
}

impl HttpResponse {
    pub fn json(status_code: u16, body: String) -> Self {
        Self {
            status_code,
            content_type: "application/json",
            body: body.into_bytes(),
            attachment: None,
        }
    }

    fn from_payload(payload: Result<String, serde_json::Error>) -> Self {
        match payload {
            Ok(body) => Self::json(200, body),
            Err(err) => error_response(500, &err.to_string()),
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Some(file_name) = self.attachment {
            if let Ok(value) =
                HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
            {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
        }
        response
    }
}

pub fn error_response(status_code: u16, message: &str) -> HttpResponse {
    HttpResponse::json(status_code, api::error_payload(message))
}

/// Uploaded reports for the lifetime of the server process.
#[derive(Debug, Default)]
pub struct Session {
    pub dataset: Dataset,
    pub files: Vec<FileSummary>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
    targets: Targets,
}

impl AppState {
    pub fn new(targets: Targets) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
            targets,
        }
    }

    /// A poisoned lock only means a handler panicked mid-request; the dataset itself is
    /// append-only, so keep serving it.
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn router(config: &Config) -> Router {
    let state = AppState::new(config.targets);
    let api = Router::new()
        .route("/api/health", get(health))
        .route("/api/reports", get(list_reports).post(upload_report))
        .route("/api/dataset", get(dataset).delete(reset_dataset))
        .route("/api/summary", get(summary))
        .route("/api/top", get(top))
        .route("/api/search", get(search))
        .route("/api/export.csv", get(export_csv))
        .route("/api/export.xlsx", get(export_xlsx))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state);

    let app = match static_files::static_service(&config.static_dir) {
        Some(service) => api.fallback_service(service),
        None => api.fallback(not_found),
    };
    app.layer(TraceLayer::new_for_http())
}

async fn health() -> HttpResponse {
    HttpResponse::from_payload(api::health_payload())
}

async fn not_found() -> HttpResponse {
    error_response(404, "Not Found")
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    name: Option<String>,
}

async fn upload_report(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> HttpResponse {
    let Some(file_name) = params.name.filter(|n| !n.trim().is_empty()) else {
        return error_response(400, "missing 'name' query parameter");
    };

    let parse_name = file_name.clone();
    let parsed =
        tokio::task::spawn_blocking(move || extract_report(&body, &parse_name)).await;
    let report = match parsed {
        Ok(Ok(report)) => report,
        Ok(Err(err)) => {
            info!(file = %file_name, error = %err, "upload rejected");
            return error_response(422, &err.to_string());
        }
        Err(err) => {
            error!(file = %file_name, error = %err, "parse task failed");
            return error_response(500, "report parsing failed");
        }
    };

    let summary = FileSummary {
        file_name,
        records: report.records.len(),
        strategy: report.layout.strategy,
    };
    let mut session = state.session();
    session.dataset.append(report.records);
    session.files.push(summary.clone());
    HttpResponse::from_payload(api::upload_payload(&summary, session.dataset.len()))
}

async fn list_reports(State(state): State<AppState>) -> HttpResponse {
    let session = state.session();
    HttpResponse::from_payload(serde_json::to_string_pretty(&serde_json::json!({
        "files": session.files,
    })))
}

async fn dataset(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> HttpResponse {
    let filter = match api::filter_from_query(&pairs) {
        Ok(filter) => filter,
        Err(err) => return error_response(400, &err.to_string()),
    };
    let session = state.session();
    HttpResponse::from_payload(api::dataset_payload(session.dataset.records(), &filter))
}

async fn reset_dataset(State(state): State<AppState>) -> HttpResponse {
    let mut session = state.session();
    let cleared = session.dataset.len();
    session.dataset.clear();
    session.files.clear();
    HttpResponse::from_payload(serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "cleared": cleared,
    })))
}

async fn summary(State(state): State<AppState>) -> HttpResponse {
    let session = state.session();
    HttpResponse::from_payload(api::summary_payload(session.dataset.records()))
}

#[derive(Debug, Deserialize)]
struct TopParams {
    n: Option<String>,
}

async fn top(State(state): State<AppState>, Query(params): Query<TopParams>) -> HttpResponse {
    let n = match api::top_n_from_query(params.n.as_deref()) {
        Ok(n) => n,
        Err(err) => return error_response(400, &err.to_string()),
    };
    let session = state.session();
    HttpResponse::from_payload(api::top_payload(session.dataset.records(), n))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> HttpResponse {
    let session = state.session();
    HttpResponse::from_payload(api::search_payload(
        session.dataset.records(),
        &params.q,
        &state.targets,
    ))
}

async fn export_csv(State(state): State<AppState>) -> HttpResponse {
    export(&state, ExportFormat::Csv).await
}

async fn export_xlsx(State(state): State<AppState>) -> HttpResponse {
    export(&state, ExportFormat::Xlsx).await
}

async fn export(state: &AppState, format: ExportFormat) -> HttpResponse {
    // Snapshot under the lock; building the file happens off it.
    let records = state.session().dataset.records().to_vec();
    let built = tokio::task::spawn_blocking(move || export_bytes(&records, format)).await;
    match built {
        Ok(Ok(body)) => HttpResponse {
            status_code: 200,
            content_type: format.content_type(),
            body,
            attachment: Some(format.file_name()),
        },
        Ok(Err(err)) => {
            error!(error = %err, "export failed");
            error_response(500, &err.to_string())
        }
        Err(err) => {
            error!(error = %err, "export task failed");
            error_response(500, "export failed")
        }
    }
}
