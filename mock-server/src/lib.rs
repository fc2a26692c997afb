use std::time::Duration;

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use uuid::Uuid;

pub mod tls;

/// Header stamped on every response so clients can tell calls apart.
pub const REQUEST_ID: &str = "x-request-id";

pub fn app() -> Router {
    Router::new()
        .route("/ok", get(ok))
        .route("/status/{code}", any(status))
        .route("/dup-headers", get(dup_headers))
        .route("/echo/headers", any(echo_headers))
        .route("/echo/method", any(echo_method))
        .route("/echo/body", any(echo_body))
        .route("/slow/{ms}", get(slow))
        .route("/redirect", get(redirect))
        .layer(middleware::map_response(stamp_request_id))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn stamp_request_id(mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

async fn ok() -> &'static str {
    "hello"
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}")).into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "bad status code").into_response(),
    }
}

async fn dup_headers() -> (HeaderMap, &'static str) {
    let mut headers = HeaderMap::new();
    headers.append("x-a", HeaderValue::from_static("1"));
    headers.append("x-a", HeaderValue::from_static("2"));
    (headers, "dup")
}

/// Request headers as a JSON object; repeated names are joined with ", ".
async fn echo_headers(headers: HeaderMap) -> Response {
    let mut object = serde_json::Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        object.insert(name.as_str().to_string(), serde_json::Value::String(joined));
    }
    (
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::Value::Object(object).to_string(),
    )
        .into_response()
}

async fn echo_method(method: Method) -> String {
    method.to_string()
}

async fn echo_body(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

async fn slow(Path(ms): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "done"
}

async fn redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/ok")], "moved").into_response()
}
