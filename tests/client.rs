//! Client and catalog tests against a canned local server
//!
//! A tiny HTTP/1.1 responder on a `TcpListener` plays the server under test,
//! so these run without network access or a real upstream.

use compat_check::client::{ChatClient, ChatRequest, ClientError, HttpClient};
use compat_check::common::config::{Config, Overrides, Settings};
use compat_check::suite::{self, Context};
use compat_check::testing::{select, Outcome, Runner};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by the mock server
#[derive(Debug, Clone)]
struct Request {
    method: String,
    path: String,
    body: String,
}

/// A canned response
struct Response {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Response {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    fn sse(events: &[Value]) -> Self {
        let mut body: String = events.iter().map(|e| format!("data: {}\n\n", e)).collect();
        body.push_str("data: [DONE]\n\n");
        Self {
            status: 200,
            content_type: "text/event-stream",
            body,
        }
    }
}

type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// Start the mock server; returns its base URL and the request log
async fn serve(handler: Handler) -> (String, Arc<Mutex<Vec<Request>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let log = Arc::new(Mutex::new(Vec::new()));

    let requests = Arc::clone(&log);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let handler = Arc::clone(&handler);
            let requests = Arc::clone(&requests);
            tokio::spawn(async move {
                let _ = respond(&mut stream, &handler, &requests).await;
            });
        }
    });

    (url, log)
}

/// Read one request, answer it and close the connection
async fn respond(
    stream: &mut TcpStream,
    handler: &Handler,
    log: &Mutex<Vec<Request>>,
) -> Option<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let request = Request { method, path, body };
    let response = handler(&request);
    log.lock().unwrap().push(request);

    let head = format!(
        "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    stream.write_all(head.as_bytes()).await.ok()?;
    stream.write_all(response.body.as_bytes()).await.ok()?;
    stream.shutdown().await.ok()
}

fn chunk(delta: Value, finish_reason: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "chatgpt/gpt-5",
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}],
    })
}

/// A well-behaved server for the happy paths
fn compliant(request: &Request) -> Response {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/health") => Response::json(200, json!({"status": "ok"})),
        ("POST", "/health") => Response::json(
            405,
            json!({"error": {"message": "method not allowed", "type": "invalid_request_error"}}),
        ),
        ("GET", "/v1/models") => Response::json(
            200,
            json!({"object": "list", "data": [
                {"id": "chatgpt/gpt-5", "object": "model", "created": 0, "owned_by": "chatgpt"}
            ]}),
        ),
        ("POST", "/v1/chat/completions") => {
            let body: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
            if body["model"] == "chatgpt/missing" {
                return Response::json(
                    404,
                    json!({"error": {"message": "The model `chatgpt/missing` does not exist", "type": "not_found_error"}}),
                );
            }
            if body["stream"] == true {
                return Response::sse(&[
                    chunk(json!({"role": "assistant"}), Value::Null),
                    chunk(json!({"content": "hello "}), Value::Null),
                    chunk(json!({"content": "world"}), Value::Null),
                    chunk(json!({}), json!("stop")),
                ]);
            }
            Response::json(
                200,
                json!({
                    "id": "chatcmpl-2",
                    "object": "chat.completion",
                    "created": 1_700_000_000,
                    "model": body["model"],
                    "system_fingerprint": null,
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "hello"},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
                }),
            )
        }
        _ => Response::json(404, json!({"error": {"message": "not found"}})),
    }
}

async fn compliant_server() -> (String, Arc<Mutex<Vec<Request>>>) {
    serve(Arc::new(compliant)).await
}

#[tokio::test]
async fn test_http_status_is_data() {
    let (url, _) = compliant_server().await;
    let http = HttpClient::new(&url, Duration::from_secs(5)).unwrap();

    let ok = http.get("/health").await.unwrap();
    assert_eq!(ok.status, 200);
    assert_eq!(ok.json().unwrap()["status"], "ok");

    let rejected = http.post("/health").await.unwrap();
    assert_eq!(rejected.status, 405);
    assert!(!rejected.is_success());
}

#[tokio::test]
async fn test_list_models_and_create() {
    let (url, log) = compliant_server().await;
    let chat = ChatClient::new(HttpClient::new(&url, Duration::from_secs(5)).unwrap());

    let models = chat.list_models().await.unwrap();
    assert_eq!(models[0]["id"], "chatgpt/gpt-5");

    let request = ChatRequest::new("chatgpt/gpt-5")
        .user("Hi")
        .param("temperature", 0.5);
    let completion = chat.create(&request).await.unwrap();
    assert_eq!(completion.content(), Some("hello"));
    assert_eq!(completion.finish_reason(), Some("stop"));

    let sent: Value = serde_json::from_str(&log.lock().unwrap()[1].body).unwrap();
    assert_eq!(sent["temperature"], 0.5);
    assert_eq!(sent["messages"][0]["content"], "Hi");
    assert!(sent.get("stream").is_none());
}

#[tokio::test]
async fn test_create_surfaces_api_error() {
    let (url, _) = compliant_server().await;
    let chat = ChatClient::new(HttpClient::new(&url, Duration::from_secs(5)).unwrap());

    let err = chat
        .create(&ChatRequest::new("chatgpt/missing").user("Hi"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_stream_collects_chunks() {
    let (url, log) = compliant_server().await;
    let chat = ChatClient::new(HttpClient::new(&url, Duration::from_secs(5)).unwrap());

    let chunks = chat
        .create_stream_collected(&ChatRequest::new("chatgpt/gpt-5").user("Hi"))
        .await
        .unwrap();
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[0].role(), Some("assistant"));
    let content: String = chunks.iter().filter_map(|c| c.content()).collect();
    assert_eq!(content, "hello world");
    assert_eq!(chunks[3].finish_reason(), Some("stop"));

    let sent: Value = serde_json::from_str(&log.lock().unwrap()[0].body).unwrap();
    assert_eq!(sent["stream"], true);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let http = HttpClient::new(&url, Duration::from_secs(2)).unwrap();
    let err = http.get("/health").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }));
    assert_eq!(err.kind(), "http");
}

fn context(url: &str) -> Arc<Context> {
    let settings = Settings::resolve(
        &Config::default(),
        Overrides {
            server: Some(url.to_string()),
            timeout_secs: Some(5),
            ..Default::default()
        },
    )
    .unwrap();
    Arc::new(Context::new(settings).unwrap())
}

#[tokio::test]
async fn test_catalog_checks_against_compliant_server() {
    let (url, _) = compliant_server().await;
    let registry = suite::registry().unwrap();
    let names = [
        "health_endpoint",
        "health_method_not_allowed",
        "models_structure",
        "models_expected",
        "content_chunks",
        "final_chunk_finish_reason",
        "usage_fields",
        "system_fingerprint_present",
        "created_timestamp",
    ];

    let runner = Runner::new(Duration::from_secs(5));
    let ctx = context(&url);
    for name in names {
        let case = registry.get(name).unwrap();
        let result = runner.run_one(case, Arc::clone(&ctx)).await;
        assert_eq!(result.outcome, Outcome::Passed, "{}", name);
    }
}

#[tokio::test]
async fn test_catalog_check_failures_and_skips() {
    let (url, _) = compliant_server().await;
    let registry = suite::registry().unwrap();
    let runner = Runner::new(Duration::from_secs(5));
    let ctx = context(&url);

    // the canned server never reports errors for bad requests
    let result = runner
        .run_one(registry.get("missing_model").unwrap(), Arc::clone(&ctx))
        .await;
    assert_eq!(
        result.outcome,
        Outcome::Failed {
            message: "Missing model should return 400".to_string(),
            expected: Some(json!(400)),
            got: Some(json!(200)),
        }
    );

    // chatgpt cannot name a tool in tool_choice
    let result = runner
        .run_one(registry.get("mcp_tool_choice_specific").unwrap(), Arc::clone(&ctx))
        .await;
    assert!(result.skipped());

    // copilot-only check is skipped for the default provider
    let result = runner
        .run_one(registry.get("copilot_max_tokens_effective").unwrap(), ctx)
        .await;
    assert!(result.skipped());
}

#[tokio::test]
async fn test_catalog_against_unreachable_server_errors() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let registry = suite::registry().unwrap();
    let selected = select(&registry, None, &["connectivity".to_string()]);
    let report = Runner::new(Duration::from_secs(5))
        .run(selected, context(&url), &suite::category_order())
        .await;

    assert_eq!(report.results().len(), 5);
    assert!(report
        .results()
        .iter()
        .all(|r| matches!(&r.outcome, Outcome::Errored { kind, .. } if kind == "http")));
    assert_eq!(report.exit_code(), 5);
}
