//! HTTP route tests against a mock cluster.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use shardgate_api::{create_router, AppState};
use shardgate_core::NodeId;
use shardgate_routing::Gateway;
use shardgate_test_utils::fixtures::*;
use shardgate_test_utils::{MockCluster, NodeFaults};
use tower::ServiceExt;

fn app(cluster: &MockCluster) -> Router {
    let gateway = Gateway::builder(legacy_config())
        .with_directory(Arc::new(cluster.clone()))
        .with_credentials(Arc::new(cluster.clone()))
        .with_connector(Arc::new(cluster.clone()))
        .build()
        .expect("mock gateway builds");
    create_router(AppState::new(gateway))
}

fn request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn error_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let cluster = MockCluster::with_nodes(&["a", "b", "c"]);
    let app = app(&cluster);

    let put = app
        .clone()
        .oneshot(request(Method::PUT, "/object/foo", "hello world"))
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::CREATED);

    // "foo" sums to 324, 324 % 3 == 0 under the legacy hash.
    assert_eq!(
        cluster.object("a", TEST_BUCKET, "foo"),
        Some(b"hello world".to_vec())
    );

    let get = app
        .oneshot(request(Method::GET, "/object/foo", Body::empty()))
        .await
        .unwrap();
    assert_eq!(get.status(), StatusCode::OK);
    assert_eq!(
        get.headers().get(CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
    assert_eq!(body_bytes(get).await, b"hello world");
}

#[tokio::test]
async fn test_get_existing_object_from_any_node() {
    let cluster = MockCluster::with_nodes(&["a", "b", "c"]);
    cluster.put_object("c", TEST_BUCKET, "photo1", b"jpeg");

    let response = app(&cluster)
        .oneshot(request(Method::GET, "/object/photo1", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"jpeg");
}

#[tokio::test]
async fn test_get_missing_object_is_404() {
    let cluster = MockCluster::with_nodes(&["a", "b"]);
    let response = app(&cluster)
        .oneshot(request(Method::GET, "/object/missing", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = error_json(response).await;
    assert_eq!(json["error"], "object not found");
    assert_eq!(json["code"], "OBJECT_NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_ids_are_422() {
    let cluster = MockCluster::with_nodes(&["a"]);
    let app = app(&cluster);
    let too_long = format!("/object/{}", "a".repeat(33));

    for uri in ["/object/foo_bar", "/object/foo-bar", too_long.as_str()] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, uri, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
    }

    let put = app
        .oneshot(request(Method::PUT, "/object/bad_id", "data"))
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(cluster.find_calls(), 0);
}

#[tokio::test]
async fn test_trailing_slash_names_the_same_object() {
    let cluster = MockCluster::with_nodes(&["a", "b"]);
    cluster.put_object("b", TEST_BUCKET, "foo", b"bar");
    let app = app(&cluster);

    let get = app
        .clone()
        .oneshot(request(Method::GET, "/object/foo/", Body::empty()))
        .await
        .unwrap();
    assert_eq!(get.status(), StatusCode::OK);
    assert_eq!(body_bytes(get).await, b"bar");

    let put = app
        .oneshot(request(Method::PUT, "/object//foo//", "baz"))
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::CREATED);
    assert_eq!(cluster.holders(TEST_BUCKET, "foo"), vec![NodeId::from("b")]);
    assert_eq!(cluster.object("b", TEST_BUCKET, "foo"), Some(b"baz".to_vec()));
}

#[tokio::test]
async fn test_malformed_object_paths_are_422() {
    let cluster = MockCluster::with_nodes(&["a"]);
    let app = app(&cluster);

    for uri in ["/object", "/object/", "/object/a/b", "/object////-!#///"] {
        let response = app
            .clone()
            .oneshot(request(Method::GET, uri, Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
        assert_eq!(error_json(response).await["code"], "INVALID_OBJECT_ID");
    }
    assert_eq!(cluster.find_calls(), 0);
}

#[tokio::test]
async fn test_id_is_checked_before_method() {
    let cluster = MockCluster::with_nodes(&["a"]);
    let response = app(&cluster)
        .oneshot(request(Method::DELETE, "/object/bad_id", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_route_is_400() {
    let cluster = MockCluster::with_nodes(&["a"]);
    let response = app(&cluster)
        .oneshot(request(Method::GET, "/objects/foo", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_json(response).await["error"], "route cannot be handled");
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let cluster = MockCluster::with_nodes(&["a"]);
    let response = app(&cluster)
        .oneshot(request(Method::DELETE, "/object/foo", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(error_json(response).await["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_empty_cluster_is_503() {
    let cluster = MockCluster::new();
    let app = app(&cluster);

    let get = app
        .clone()
        .oneshot(request(Method::GET, "/object/foo", Body::empty()))
        .await
        .unwrap();
    assert_eq!(get.status(), StatusCode::SERVICE_UNAVAILABLE);

    let put = app
        .oneshot(request(Method::PUT, "/object/foo", "data"))
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_node_failure_is_502() {
    let cluster = MockCluster::with_nodes(&["a", "b"]);
    cluster.set_faults("a", NodeFaults::failing_probes());

    let response = app(&cluster)
        .oneshot(request(Method::PUT, "/object/foo", "data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(cluster.holders(TEST_BUCKET, "foo").is_empty());
}

#[tokio::test]
async fn test_overwrite_keeps_existing_owner() {
    let cluster = MockCluster::with_nodes(&["a", "b", "c"]);
    cluster.put_object("b", TEST_BUCKET, "foo", b"old");

    let response = app(&cluster)
        .oneshot(request(Method::PUT, "/object/foo", "new"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(cluster.object("b", TEST_BUCKET, "foo"), Some(b"new".to_vec()));
    assert_eq!(cluster.object("a", TEST_BUCKET, "foo"), None);
}

#[tokio::test]
async fn test_health() {
    let cluster = MockCluster::new();
    let response = app(&cluster)
        .oneshot(request(Method::GET, "/health", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
