// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-Plane HTTP Surface (spec §4.9, §6): a thin REST adapter that
//! translates requests into `LifecycleManager` calls.

use crate::state::AppState;
use ah_core::{AppError, AppRecord};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthResponse {
    ok: bool,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

#[derive(Serialize)]
pub struct RecordResponse {
    app_id: String,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    status: ah_core::AppStatus,
    port: Option<u16>,
    pid: Option<u32>,
    error: Option<String>,
    requirements_digest: String,
    entry_digest: String,
}

impl RecordResponse {
    fn from_record(r: &AppRecord) -> Self {
        Self {
            app_id: r.app_id.as_str().to_string(),
            name: r.name.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            status: r.status,
            port: r.port,
            pid: r.pid,
            error: r.error.clone(),
            requirements_digest: r.requirements_digest.clone(),
            entry_digest: r.entry_digest.clone(),
        }
    }
}

pub async fn list_apps(State(state): State<AppState>) -> Response {
    match state.lifecycle.list().await {
        Ok(records) => {
            Json(records.iter().map(RecordResponse::from_record).collect::<Vec<_>>()).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub async fn get_app(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    match state.lifecycle.get(&app_id).await {
        Ok(record) => Json(RecordResponse::from_record(&record)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Serialize)]
pub struct CreateResponse {
    app_id: String,
    name: String,
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_url: Option<String>,
    status: ah_core::AppStatus,
}

#[derive(Default)]
struct Upload {
    name: Option<String>,
    requirements: Option<Vec<u8>>,
    app: Option<Vec<u8>>,
}

async fn read_multipart(mut multipart: Multipart) -> Result<Upload, Response> {
    let mut upload = Upload::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err((StatusCode::BAD_REQUEST, format!("invalid multipart body: {err}")).into_response()),
        };
        let Some(name) = field.name().map(str::to_string) else { continue };
        match name.as_str() {
            "name" => {
                upload.name = field.text().await.ok();
            }
            "requirements" => {
                upload.requirements =
                    field.bytes().await.ok().map(|b| b.to_vec());
            }
            "app" => {
                upload.app = field.bytes().await.ok().map(|b| b.to_vec());
            }
            _ => {}
        }
    }
    Ok(upload)
}

pub async fn create_app(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_multipart(multipart).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let (Some(requirements), Some(app)) = (upload.requirements, upload.app) else {
        return (StatusCode::BAD_REQUEST, "both `requirements` and `app` files are required").into_response();
    };
    let name = upload.name.unwrap_or_default();

    match state.lifecycle.create(name, &requirements, &app).await {
        Ok(record) => Json(CreateResponse {
            app_id: record.app_id.as_str().to_string(),
            name: record.name.clone(),
            port: record.port,
            access_url: state.access_url(record.app_id.as_str()),
            status: record.status,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn update_app(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let upload = match read_multipart(multipart).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match state
        .lifecycle
        .update(&app_id, upload.name, upload.requirements.as_deref(), upload.app.as_deref())
        .await
    {
        Ok(record) => Json(RecordResponse::from_record(&record)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Serialize)]
pub struct StartResponse {
    app_id: String,
    status: ah_core::AppStatus,
    port: Option<u16>,
}

pub async fn start_app(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    match state.lifecycle.start(&app_id).await {
        Ok(record) => Json(StartResponse {
            app_id: record.app_id.as_str().to_string(),
            status: record.status,
            port: record.port,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Serialize)]
pub struct StopResponse {
    app_id: String,
    status: ah_core::AppStatus,
}

pub async fn stop_app(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    match state.lifecycle.stop(&app_id).await {
        Ok(record) => {
            Json(StopResponse { app_id: record.app_id.as_str().to_string(), status: record.status })
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Serialize)]
pub struct DeleteResponse {
    deleted: bool,
    app_id: String,
}

pub async fn delete_app(State(state): State<AppState>, Path(app_id): Path<String>) -> Response {
    match state.lifecycle.delete(&app_id).await {
        Ok(()) => Json(DeleteResponse { deleted: true, app_id }).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
pub struct TailQuery {
    tail: Option<usize>,
}

#[derive(Serialize)]
pub struct LogsResponse {
    app_id: String,
    logs: String,
}

pub async fn tail_logs(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    Query(query): Query<TailQuery>,
) -> Response {
    let n = query.tail.unwrap_or(ah_storage::MIN_TAIL);
    match state.lifecycle.tail_logs(&app_id, n).await {
        Ok(logs) => Json(LogsResponse { app_id, logs }).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AppError) -> Response {
    let status = match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AppError::ConflictingState(_) => StatusCode::CONFLICT,
        AppError::IdCollision(_)
        | AppError::NoPortsAvailable
        | AppError::UpstreamUnavailable(_)
        | AppError::Io(_)
        | AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}
