//! End-to-end calls through `UreqTransport` against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread, then
//! drives sessions over real HTTP. Each test uses its own fetcher and slot so
//! tests can run in parallel against the shared server.

use std::net::SocketAddr;
use std::sync::OnceLock;

use fetch_core::{FetchConfig, Fetcher, UreqTransport};

/// Address of the shared mock server, started on first use.
fn server() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    })
}

fn url(path: &str) -> String {
    format!("http://{}{path}", server())
}

fn fetcher() -> Fetcher<UreqTransport> {
    Fetcher::from_config(&FetchConfig::default())
}

#[test]
fn get_reads_status_headers_and_body() {
    let fetcher = fetcher();
    let session = fetcher.session(3, 100);
    session.get(&url("/ok"));

    assert_eq!(session.status(), 200);
    assert_eq!(session.header("content-length").as_deref(), Some("5"));
    assert_eq!(session.header("CONTENT-LENGTH").as_deref(), Some("5"));
    assert!(session.header(mock_server::REQUEST_ID).is_some());
    assert_eq!(session.body(), "hello");
    assert_eq!(session.error(), None);
}

#[test]
fn slot_reuse_by_new_transaction_hides_previous_result() {
    let fetcher = fetcher();
    fetcher.session(3, 100).get(&url("/ok"));

    let session = fetcher.session(3, 101);
    assert_eq!(session.status(), 0);
    assert_eq!(session.body(), "");
    assert_eq!(session.header("content-length"), None);
    assert_eq!(session.error(), None);
}

#[test]
fn http_error_status_is_not_a_failure() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.get(&url("/status/500"));

    assert_eq!(session.status(), 500);
    assert_eq!(session.error(), None);
    assert_eq!(session.body(), "status 500");
}

#[test]
fn connection_refused_is_reported_as_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.header_add("X-Foo: 1");
    session.set_method("PURGE");
    session.get(&format!("http://127.0.0.1:{port}/"));

    assert_eq!(session.status(), 0);
    let error = session.error().expect("transport error recorded");
    assert!(!error.is_empty());

    // One-shot settings were consumed by the failed call.
    session.get(&url("/echo/method"));
    assert_eq!(session.body(), "GET");
}

#[test]
fn duplicate_response_headers_return_last_value() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.get(&url("/dup-headers"));

    assert_eq!(session.status(), 200);
    assert_eq!(session.header("x-a").as_deref(), Some("2"));
}

#[test]
fn head_returns_headers_without_body() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.head(&url("/ok"));

    assert_eq!(session.status(), 200);
    assert_eq!(session.body(), "");
    assert!(session.header(mock_server::REQUEST_ID).is_some());
}

#[test]
fn post_sends_body_and_headers() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.header_add("Content-Type: text/plain");
    session.post(&url("/echo/body"), "a=1&b=2");

    assert_eq!(session.status(), 200);
    assert_eq!(session.body(), "a=1&b=2");
    assert_eq!(session.header("content-type").as_deref(), Some("text/plain"));
}

#[test]
fn request_headers_are_sent_once() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.header_add("X-Foo: bar");
    session.header_add("X-Drop: me");
    session.header_add("x-drop: me too");
    session.header_remove("X-DROP");
    session.get(&url("/echo/headers"));

    let json: serde_json::Value = serde_json::from_str(&session.body()).unwrap();
    assert_eq!(json["x-foo"], "bar");
    assert!(json.get("x-drop").is_none());
    assert!(json["user-agent"].as_str().unwrap().starts_with("fetch-core/"));

    session.get(&url("/echo/headers"));
    let json: serde_json::Value = serde_json::from_str(&session.body()).unwrap();
    assert!(json.get("x-foo").is_none());
}

#[test]
fn custom_method_applies_to_next_call_only() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.set_method("PURGE");
    session.get(&url("/echo/method"));
    assert_eq!(session.body(), "PURGE");

    session.get(&url("/echo/method"));
    assert_eq!(session.body(), "GET");
}

#[test]
fn custom_method_keeps_post_body() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.set_method("PUT");
    session.post(&url("/echo/body"), "payload");

    assert_eq!(session.status(), 200);
    assert_eq!(session.body(), "payload");
}

#[test]
fn redirects_are_not_followed() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.get(&url("/redirect"));

    assert_eq!(session.status(), 302);
    assert_eq!(session.header("location").as_deref(), Some("/ok"));
}

#[test]
fn timeout_is_reported_as_error() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.set_timeout(100);
    session.get(&url("/slow/2000"));

    assert_eq!(session.status(), 0);
    assert!(session.error().is_some());

    // Timeout survives the call; a fast endpoint still succeeds within it.
    session.get(&url("/ok"));
    assert_eq!(session.status(), 200);
    assert_eq!(session.error(), None);
}

#[test]
fn invalid_url_fails_at_execution_time() {
    let fetcher = fetcher();
    let session = fetcher.session(0, 1);
    session.get("not a url");

    assert_eq!(session.status(), 0);
    assert!(session.error().is_some());
}
