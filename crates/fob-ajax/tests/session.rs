//! End-to-end session flows against an in-process context.
//!
//! These run without a browser: `LocalContext` stands in for the page and a
//! canned transport stands in for the network.

use async_trait::async_trait;
use fob_ajax::{
    script, AjaxConfig, AjaxError, AjaxSession, Bridge, Exchange, LocalContext, OutboundRequest,
    Snippet, Transport, UrlMatcher,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_test::{assert_err, assert_ok};
use tracing_subscriber::EnvFilter;

const SIMPLE_JSON: &str = "{ \"OK\": true }\n";

/// Serves `/simple_get.json` and 404s everything else.
struct FixtureSite;

#[async_trait]
impl Transport for FixtureSite {
    async fn send(&self, request: OutboundRequest) -> fob_ajax::Result<Exchange> {
        let (status, body) = if request.url == "/simple_get.json" {
            (200, SIMPLE_JSON)
        } else {
            (404, "not found")
        };
        Ok(Exchange {
            method: request.method,
            url: request.url,
            status,
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Content-Length".into(), body.len().to_string()),
            ],
            body: body.to_string(),
        })
    }
}

/// Routes library logs to the test harness; set `RUST_LOG` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn context() -> Arc<LocalContext> {
    init_tracing();
    Arc::new(LocalContext::new(FixtureSite))
}

async fn click(context: &LocalContext) {
    context
        .send(OutboundRequest::get("/simple_get.json"))
        .await
        .expect("fixture request failed");
}

#[tokio::test]
async fn sets_up_the_interceptor() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());

    assert!(assert_ok!(session.setup_interceptor().await));

    let store = context.store("__fob_ajax").expect("store should exist");
    assert!(store.is_empty());
}

#[tokio::test]
async fn finds_a_store_installed_on_load() {
    let context = context();
    context.ensure_store("__fob_ajax");
    click(&context).await;

    let mut session = AjaxSession::new(context.clone());
    session.expect_request("GET", "/stale.json", 200);
    assert!(assert_ok!(session.setup_interceptor().await));

    assert!(session.expectations().is_empty(), "setup starts a fresh queue");
    assert_eq!(assert_ok!(session.get_requests().await).len(), 1);
}

#[tokio::test]
async fn intercepts_a_simple_get() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    session.expect_request("GET", "/simple_get.json", 200);
    click(&context).await;

    assert_ok!(session.assert_requests().await);
}

#[tokio::test]
async fn uses_regular_expressions_for_urls() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    session.expect_request("get", UrlMatcher::pattern(r"simple_get\.json").unwrap(), 200);
    click(&context).await;

    assert_ok!(session.assert_requests().await);
}

#[tokio::test]
async fn errors_on_wrong_request_count() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    session
        .expect_request("GET", "/simple_get.json", 200)
        .expect_request("GET", "/simple_get.json", 200);
    click(&context).await;

    let err = assert_err!(session.assert_requests().await);
    assert_eq!(err.to_string(), "Expected 2 requests but was 1");
}

#[tokio::test]
async fn errors_on_wrong_method() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    session.expect_request("PUT", "/simple_get.json", 200);
    click(&context).await;

    let err = assert_err!(session.assert_requests().await);
    assert!(matches!(err, AjaxError::MethodMismatch { .. }));
    assert!(err.to_string().contains("PUT"));
    assert!(err.to_string().contains("GET"));
}

#[tokio::test]
async fn errors_on_wrong_url() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    session.expect_request("GET", "/wrong.json", 200);
    click(&context).await;

    let err = assert_err!(session.assert_requests().await);
    assert!(err.to_string().contains("/wrong.json"));
}

#[tokio::test]
async fn errors_if_pattern_does_not_match() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    session.expect_request("GET", UrlMatcher::pattern(r"wrong\.json").unwrap(), 200);
    click(&context).await;

    let err = assert_err!(session.assert_requests().await);
    assert!(err.to_string().contains("/simple_get.json"));
}

#[tokio::test]
async fn errors_on_wrong_status_code() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    session.expect_request("GET", "/simple_get.json", 404);
    click(&context).await;

    let err = assert_err!(session.assert_requests().await);
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn accesses_a_certain_request() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);
    click(&context).await;

    let request = assert_ok!(session.get_request(0).await);
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "/simple_get.json");
    assert_eq!(request.body, json!({ "OK": true }));
    assert_eq!(request.status_code, 200);
    assert_eq!(request.headers["content-length"], "15");
}

#[tokio::test]
async fn missing_index_is_not_found() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    let err = assert_err!(session.get_request(3).await);
    assert!(matches!(err, AjaxError::RequestNotFound { index: 3 }));
    assert!(err.to_string().contains('3'));
}

#[tokio::test]
async fn gets_multiple_requests_in_order() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    click(&context).await;
    context
        .send(OutboundRequest::new("delete", "/gone"))
        .await
        .unwrap();
    click(&context).await;

    let requests: Vec<_> = assert_ok!(session.get_requests().await)
        .into_iter()
        .map(|r| r.expect("no holes"))
        .collect();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].status_code, 404);
    assert_eq!(requests[1].body, json!("not found"));

    for (i, request) in requests.iter().enumerate() {
        assert_eq!(&assert_ok!(session.get_request(i).await), request);
    }
}

#[tokio::test]
async fn rebuilds_index_keyed_results() {
    let context = Arc::new(LocalContext::new(FixtureSite).with_index_keyed_arrays());
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);

    click(&context).await;
    click(&context).await;

    let requests = assert_ok!(session.get_requests().await);
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(Option::is_some));

    session
        .expect_request("GET", "/simple_get.json", 200)
        .expect_request("GET", "/simple_get.json", 200);
    assert_ok!(session.assert_requests().await);
}

#[tokio::test]
async fn setup_twice_keeps_records() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);
    click(&context).await;

    assert_ok!(session.setup_interceptor().await);
    click(&context).await;

    assert_eq!(assert_ok!(session.get_requests().await).len(), 2);
}

#[tokio::test]
async fn reinstalls_after_reload() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());
    assert_ok!(session.setup_interceptor().await);
    click(&context).await;

    context.reload();
    let err = assert_err!(session.get_requests().await);
    assert!(matches!(err, AjaxError::NotInstalled { .. }));

    assert_ok!(session.setup_interceptor().await);
    assert!(assert_ok!(session.get_requests().await).is_empty());

    session.expect_request("GET", "/simple_get.json", 200);
    click(&context).await;
    assert_ok!(session.assert_requests().await);
}

/// A context that accepts the install call but never exposes a store.
struct Unresponsive;

#[async_trait]
impl Bridge for Unresponsive {
    async fn execute(&self, _snippet: &Snippet, _args: &[Value]) -> fob_ajax::Result<Value> {
        Ok(Value::Null)
    }
}

#[tokio::test]
async fn setup_times_out_when_store_never_appears() {
    let config = AjaxConfig {
        setup_timeout_ms: 200,
        poll_interval_ms: 20,
        ..AjaxConfig::default()
    };
    let mut session = AjaxSession::with_config(Unresponsive, config);

    let start = Instant::now();
    let err = assert_err!(session.setup_interceptor().await);

    assert!(matches!(err, AjaxError::SetupTimeout { timeout } if timeout == Duration::from_millis(200)));
    assert!(start.elapsed() >= Duration::from_millis(200));
}

/// Installs instantly, but every confirming probe stalls far past the deadline.
#[derive(Default)]
struct StalledConfirm {
    probes: AtomicU32,
}

#[async_trait]
impl Bridge for StalledConfirm {
    async fn execute(&self, snippet: &Snippet, _args: &[Value]) -> fob_ajax::Result<Value> {
        if snippet.name == script::PROBE_STORE.name
            && self.probes.fetch_add(1, Ordering::SeqCst) > 0
        {
            tokio::time::sleep(Duration::from_secs(3)).await;
            return Ok(json!([]));
        }
        Ok(Value::Null)
    }
}

#[tokio::test]
async fn setup_deadline_holds_when_the_context_stalls() {
    let config = AjaxConfig {
        setup_timeout_ms: 200,
        poll_interval_ms: 20,
        ..AjaxConfig::default()
    };
    let mut session = AjaxSession::with_config(StalledConfirm::default(), config);

    let start = Instant::now();
    let err = assert_err!(session.setup_interceptor().await);

    assert!(matches!(err, AjaxError::SetupTimeout { .. }));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(session.bridge().probes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn custom_namespace_is_used_throughout() {
    let context = context();
    let config = AjaxConfig {
        namespace: "__recorder".into(),
        ..AjaxConfig::default()
    };
    let mut session = AjaxSession::with_config(context.clone(), config);
    assert_ok!(session.setup_interceptor().await);

    assert!(context.store("__recorder").is_some());
    assert!(context.store("__fob_ajax").is_none());

    let probed = assert_ok!(
        context
            .execute(&script::PROBE_STORE, &[json!("__recorder")])
            .await
    );
    assert_eq!(probed, json!([]));
}

#[tokio::test]
async fn dispatches_named_commands() {
    let context = context();
    let mut session = AjaxSession::new(context.clone());

    assert_eq!(
        assert_ok!(session.dispatch("setupInterceptor", &[]).await),
        json!(true)
    );
    assert_eq!(
        assert_ok!(
            session
                .dispatch(
                    "expectRequest",
                    &[json!("get"), json!({ "pattern": r"simple_get\.json" }), json!(200)]
                )
                .await
        ),
        json!({})
    );
    click(&context).await;

    assert_eq!(
        assert_ok!(session.dispatch("assertRequests", &[]).await),
        json!(true)
    );

    let one = assert_ok!(session.dispatch("getRequest", &[json!(0)]).await);
    assert_eq!(one["statusCode"], 200);
    assert_eq!(one["headers"]["content-type"], "application/json");

    let all = assert_ok!(session.dispatch("getRequest", &[]).await);
    assert_eq!(all, assert_ok!(session.dispatch("getRequests", &[]).await));
    assert_eq!(all.as_array().map(Vec::len), Some(1));

    let err = assert_err!(session.dispatch("pause", &[]).await);
    assert!(matches!(err, AjaxError::UnknownCommand(_)));
}
