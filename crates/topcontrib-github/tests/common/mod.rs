//! Scripted transport and page fixtures shared by integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use topcontrib_core::{HttpResponse, StreamError, Transport};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One recorded GET
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub token: String,
}

/// Replays canned responses in order and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, StreamError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: StreamError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(error)])),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, token: &str) -> Result<HttpResponse, StreamError> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            token: token.to_string(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(StreamError::Transport {
                    message: format!("no scripted response for {url}"),
                })
            })
    }
}

/// Never answers; only cancellation gets a caller out.
pub struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn get(&self, _url: &str, _token: &str) -> Result<HttpResponse, StreamError> {
        std::future::pending().await
    }
}

pub fn user(id: u64) -> Value {
    json!({
        "login": format!("user{id}"),
        "id": id,
        "url": format!("https://api.github.com/users/user{id}"),
        "type": "User",
        "site_admin": false,
        "score": 1.0
    })
}

pub fn page_body(ids: Range<u64>) -> Vec<u8> {
    let items: Vec<Value> = ids.clone().map(user).collect();
    serde_json::to_vec(&json!({
        "total_count": ids.end,
        "incomplete_results": false,
        "items": items
    }))
    .unwrap()
}

pub fn response(status: u16, body: Vec<u8>) -> HttpResponse {
    HttpResponse {
        status,
        reason: String::new(),
        headers: HeaderMap::new(),
        body,
    }
}

pub fn page(ids: Range<u64>) -> HttpResponse {
    response(200, page_body(ids))
}

pub fn with_header(mut response: HttpResponse, name: &'static str, value: &str) -> HttpResponse {
    response.headers.insert(
        HeaderName::from_static(name),
        HeaderValue::from_str(value).unwrap(),
    );
    response
}

pub fn with_next(response: HttpResponse, next: &str) -> HttpResponse {
    let value = format!(r#"<{next}>; rel="next", <{next}&last=1>; rel="last""#);
    with_header(response, "link", &value)
}

/// Quota spent, refilling at `reset` (epoch seconds)
pub fn exhausted(response: HttpResponse, reset: u64) -> HttpResponse {
    let response = with_header(response, "x-ratelimit-remaining", "0");
    with_header(response, "x-ratelimit-reset", &reset.to_string())
}

pub fn epoch_secs_from_now(delta: Duration) -> u64 {
    (SystemTime::now() + delta)
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn ids(records: &[topcontrib_core::Record]) -> Vec<u64> {
    records
        .iter()
        .map(|r| r.get("id").and_then(Value::as_u64).unwrap())
        .collect()
}
