//! Thin admin HTTP surface over the server store.
//!
//! One endpoint, `/api/servers`, dispatches on an `action` query
//! parameter (`list`, `get`, `create`, `update`, `delete`, `toggle`).
//! Every response is a JSON envelope with a `success` flag so admin
//! clients branch on one field regardless of action.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use kirim_store::{ServerDraft, ServerStore, StoreError};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

const SERVERS_ENDPOINT: &str = "/api/servers";

#[derive(Debug, Deserialize)]
struct ActionParams {
    #[serde(default)]
    action: String,
    id: Option<i64>,
}

/// Builds the admin router over `store`.
pub fn build_admin_router(store: Arc<ServerStore>) -> Router {
    Router::new()
        .route(SERVERS_ENDPOINT, any(handle_servers))
        .with_state(store)
}

async fn handle_servers(
    State(store): State<Arc<ServerStore>>,
    Query(params): Query<ActionParams>,
    body: Bytes,
) -> Response {
    debug!(action = %params.action, id = ?params.id, "admin action dispatch");
    let result = match params.action.as_str() {
        "list" => handle_list(&store),
        "get" => handle_get(&store, params.id),
        "create" => handle_create(&store, &body),
        "update" => handle_update(&store, params.id, &body),
        "delete" => handle_delete(&store, params.id),
        "toggle" => handle_toggle(&store, params.id),
        other => Ok(failure(
            StatusCode::BAD_REQUEST,
            format!("unknown action '{other}'"),
        )),
    };
    match result {
        Ok(response) => response,
        Err(error) => {
            error!(%error, action = %params.action, "admin store operation failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("store operation failed: {error}"),
            )
        }
    }
}

fn handle_list(store: &ServerStore) -> Result<Response, StoreError> {
    let servers = store.list()?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "data": servers })),
    )
        .into_response())
}

fn handle_get(store: &ServerStore, id: Option<i64>) -> Result<Response, StoreError> {
    let Some(id) = id else {
        return Ok(missing_id());
    };
    match store.get_by_id(id)? {
        Some(server) => Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "data": server })),
        )
            .into_response()),
        None => Ok(not_found(id)),
    }
}

fn handle_create(store: &ServerStore, body: &Bytes) -> Result<Response, StoreError> {
    let draft = match parse_draft(body) {
        Ok(draft) => draft,
        Err(response) => return Ok(response),
    };
    let id = store.create(&draft)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "id": id, "message": "server created" })),
    )
        .into_response())
}

fn handle_update(store: &ServerStore, id: Option<i64>, body: &Bytes) -> Result<Response, StoreError> {
    let Some(id) = id else {
        return Ok(missing_id());
    };
    let draft = match parse_draft(body) {
        Ok(draft) => draft,
        Err(response) => return Ok(response),
    };
    if store.update(id, &draft)? {
        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "id": id, "message": "server updated" })),
        )
            .into_response())
    } else {
        Ok(not_found(id))
    }
}

fn handle_delete(store: &ServerStore, id: Option<i64>) -> Result<Response, StoreError> {
    let Some(id) = id else {
        return Ok(missing_id());
    };
    if store.delete(id)? {
        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "id": id, "message": "server deleted" })),
        )
            .into_response())
    } else {
        Ok(not_found(id))
    }
}

fn handle_toggle(store: &ServerStore, id: Option<i64>) -> Result<Response, StoreError> {
    let Some(id) = id else {
        return Ok(missing_id());
    };
    if store.toggle_active(id)? {
        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "id": id, "message": "server toggled" })),
        )
            .into_response())
    } else {
        Ok(not_found(id))
    }
}

fn parse_draft(body: &Bytes) -> Result<ServerDraft, Response> {
    serde_json::from_slice(body).map_err(|error| {
        failure(
            StatusCode::BAD_REQUEST,
            format!("invalid server payload: {error}"),
        )
    })
}

fn missing_id() -> Response {
    failure(
        StatusCode::BAD_REQUEST,
        "query parameter 'id' is required".to_string(),
    )
}

fn not_found(id: i64) -> Response {
    failure(StatusCode::NOT_FOUND, format!("server {id} not found"))
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}
