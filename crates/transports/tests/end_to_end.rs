//! Exercises every bundled transport against a local mock backend.

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use connector::{
    BasicAuth, CallOptions, ConfigRecord, Headers, MemoryStorage, ServiceCore, StorageValue,
    BASE_URL_KEY,
};
use serde_json::{json, Value};
use transports::TransportKind;

async fn spawn_backend() -> String {
    let app = Router::new()
        .route(
            "/x",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"code": 404, "error": "Not Found"})),
                )
            }),
        )
        .route("/node/1", get(|| async { Json(json!({"title": "Hello"})) }))
        .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Fatal error") }),
        )
        .route(
            "/unknown-status",
            get(|| async { (StatusCode::from_u16(599).unwrap(), "upstream exploded") }),
        )
        .route("/not-json", get(|| async { "plain text" }))
        .route("/echo", post(echo));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn echo(headers: HeaderMap, body: String) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    Json(json!({
        "authorization": header("authorization"),
        "content_type": header("content-type"),
        "site": header("x-site"),
        "trace": header("x-trace"),
        "body": serde_json::from_str::<Value>(&body).unwrap_or(Value::Null),
    }))
}

fn core_for(base_url: &str, kind: TransportKind) -> ServiceCore {
    let mut initial = ConfigRecord::new();
    initial.insert(BASE_URL_KEY.into(), base_url.into());
    let mut core = ServiceCore::new(initial);
    let transport = kind.build(core.base_url().unwrap().as_deref());
    core.set_transport_service(transport)
        .set_session_service(Arc::new(MemoryStorage::new()));
    core
}

#[tokio::test]
async fn structured_404_is_normalized_for_every_transport() {
    let base = spawn_backend().await;
    for kind in TransportKind::ALL {
        let core = core_for(&base, kind);
        assert_eq!(
            core.config_service().unwrap().get_item(BASE_URL_KEY),
            Some(StorageValue::from(base.as_str()))
        );

        let transport = core.transport_service().unwrap();
        let err = transport
            .call("GET", "/x", CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "DrupalError: 404 Not Found", "{kind}");
    }
}

#[tokio::test]
async fn successful_json_body_is_decoded() {
    let base = spawn_backend().await;
    for kind in TransportKind::ALL {
        let transport = core_for(&base, kind).transport_service().unwrap();
        let body = transport.call("GET", "node/1", CallOptions::new()).await.unwrap();
        assert_eq!(body, json!({"title": "Hello"}), "{kind}");
    }
}

#[tokio::test]
async fn empty_success_body_decodes_to_null() {
    let base = spawn_backend().await;
    for kind in TransportKind::ALL {
        let transport = core_for(&base, kind).transport_service().unwrap();
        let body = transport.call("GET", "/empty", CallOptions::new()).await.unwrap();
        assert_eq!(body, Value::Null, "{kind}");
    }
}

#[tokio::test]
async fn unstructured_error_body_is_wrapped_under_code_100() {
    let base = spawn_backend().await;
    let expected = [
        "Reqwest method failed: \"Request failed with status code 500\"",
        "Fetch method failed: \"Internal Server Error\"",
        "Hyper method failed: \"Internal Server Error\"",
    ];
    for (kind, message) in TransportKind::ALL.into_iter().zip(expected) {
        let transport = core_for(&base, kind).transport_service().unwrap();
        let err = transport.call("GET", "/broken", CallOptions::new()).await.unwrap_err();
        assert_eq!(err.code(), 100, "{kind}");
        assert_eq!(err.message(), message, "{kind}");
    }
}

#[tokio::test]
async fn status_without_reason_phrase_renders_identically() {
    let base = spawn_backend().await;
    for kind in TransportKind::ALL {
        let transport = core_for(&base, kind).transport_service().unwrap();
        let err = transport
            .call("GET", "/unknown-status", CallOptions::new())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "DrupalError: 100 {} method failed: \"Request failed with status code 599\"",
                transport.name()
            ),
            "{kind}"
        );
    }
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_failure() {
    let base = spawn_backend().await;
    for kind in TransportKind::ALL {
        let transport = core_for(&base, kind).transport_service().unwrap();
        let err = transport.call("GET", "/not-json", CallOptions::new()).await.unwrap_err();
        assert_eq!(err.code(), 100, "{kind}");
        assert!(err.message().starts_with(transport.name()), "{kind}");
    }
}

#[tokio::test]
async fn headers_auth_and_body_reach_the_wire_identically() {
    let base = spawn_backend().await;
    let mut responses = Vec::new();
    for kind in TransportKind::ALL {
        let transport = core_for(&base, kind).transport_service().unwrap();
        transport.add_default_headers(Headers::from([
            ("X-Site".to_owned(), "default".to_owned()),
            ("X-Trace".to_owned(), "t-1".to_owned()),
        ]));
        let options = CallOptions::new()
            .with_header("x-site", "override")
            .with_auth(BasicAuth::new("admin", "secret"))
            .with_body(json!({"title": "Hello"}));
        responses.push(transport.call("post", "/echo", options).await.unwrap());
    }

    let expected = json!({
        "authorization": "Basic YWRtaW46c2VjcmV0",
        "content_type": "application/json",
        "site": "override",
        "trace": "t-1",
        "body": {"title": "Hello"},
    });
    for response in responses {
        assert_eq!(response, expected);
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    for kind in TransportKind::ALL {
        let transport = kind.build(Some("http://127.0.0.1:1"));
        let err = transport.call("GET", "/x", CallOptions::new()).await.unwrap_err();
        assert_eq!(err.code(), 100, "{kind}");
        assert!(
            err.message().starts_with(&format!("{} method failed: \"", transport.name())),
            "{kind}: {err}"
        );
    }
}

#[tokio::test]
async fn invalid_method_never_reaches_the_network() {
    for kind in TransportKind::ALL {
        let transport = kind.build(Some("http://127.0.0.1:1"));
        let err = transport.call("BAD METHOD", "/x", CallOptions::new()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "DrupalError: 100 {} method failed: \"invalid HTTP method 'BAD METHOD'\"",
                transport.name()
            )
        );
    }
}
