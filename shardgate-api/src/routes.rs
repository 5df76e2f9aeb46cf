//! HTTP routes.
//!
//! - `GET /object/{id}` streams the object back, 404 when no node has it
//! - `PUT /object/{id}` streams the request body to the owning node, 201
//! - `GET /health` liveness probe
//!
//! Everything under `/object` is an object path: surrounding slashes are
//! trimmed and the rest must be a valid ID, so `/object/foo/` names `foo`
//! while `/object/`, `/object/a/b` answer 422. The ID is checked before the
//! method, so an unsupported method on a valid ID answers 405. Paths outside
//! `/object` answer 400.

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use futures_util::TryStreamExt;
use serde_json::json;
use shardgate_core::{ObjectId, ObjectReader};
use tokio_util::io::{ReaderStream, StreamReader};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::validation::validate_object_id;

const OBJECT_PREFIX: &str = "/object";

/// Build the gateway router.
pub fn create_router(state: AppState) -> Router {
    let object: MethodRouter<AppState> = get(get_object)
        .put(put_object)
        .fallback(method_not_allowed);

    Router::new()
        .route(OBJECT_PREFIX, object.clone())
        .route("/object/", object.clone())
        .route("/object/*rest", object)
        .route("/health", get(health))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Extract the object ID from a path under `/object`.
fn object_id_from_path(path: &str) -> ApiResult<ObjectId> {
    let raw = path
        .strip_prefix(OBJECT_PREFIX)
        .unwrap_or(path)
        .trim_matches('/');
    validate_object_id(raw)
}

async fn get_object(State(state): State<AppState>, uri: Uri) -> ApiResult<Response> {
    let object_id = object_id_from_path(uri.path())?;

    let reader = state
        .gateway
        .read(&object_id)
        .await?
        .ok_or_else(ApiError::object_not_found)?;

    let body = Body::from_stream(ReaderStream::new(reader));
    Ok(([(CONTENT_TYPE, "application/octet-stream")], body).into_response())
}

async fn put_object(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<StatusCode> {
    let object_id = object_id_from_path(uri.path())?;

    let size_hint = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader: ObjectReader = Box::new(StreamReader::new(stream));

    state.gateway.write(&object_id, reader, size_hint).await?;
    Ok(StatusCode::CREATED)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

async fn method_not_allowed(uri: Uri) -> ApiError {
    match object_id_from_path(uri.path()) {
        Ok(_) => ApiError::method_not_allowed(),
        Err(err) => err,
    }
}
