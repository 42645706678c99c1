//! Paginated user search feeding a [`Stream`].
//!
//! One request in flight at a time. Each page is pushed record by record,
//! then the `Link: rel="next"` cursor is followed until the cap is reached
//! or the last page is seen.

use std::sync::Arc;

use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use topcontrib_core::{HttpResponse, Record, Sink, Stream, StreamError, Transport, USER_KIND};

use crate::config::SearchConfig;
use crate::link::next_page;
use crate::query::Query;
use crate::rate_limit::{RateLimit, wait_for_reset};

/// Body of one search page. Other top-level fields are ignored.
#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    total_count: Option<u64>,
    items: Vec<Map<String, Value>>,
}

fn decode_page(body: &[u8]) -> Result<SearchPage, StreamError> {
    serde_json::from_slice(body)
        .map_err(|e| StreamError::Decode(format!("invalid search page: {e}")))
}

/// Prefer GitHub's `{"message": ...}` error body over the bare reason phrase
fn status_error(response: &HttpResponse) -> StreamError {
    let message = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| response.reason.clone());
    StreamError::Status {
        status: response.status,
        message,
    }
}

/// Rejections GitHub uses when the quota is spent
fn is_throttle_status(status: u16) -> bool {
    matches!(status, 403 | 429)
}

/// Producer for one validated [`Query`] against a search host.
pub struct UserSearch {
    transport: Arc<dyn Transport>,
    query: Query,
    host: String,
    token: String,
    config: SearchConfig,
}

impl UserSearch {
    pub fn new(
        transport: Arc<dyn Transport>,
        query: Query,
        host: impl Into<String>,
        token: impl Into<String>,
        config: SearchConfig,
    ) -> Self {
        Self {
            transport,
            query,
            host: host.into(),
            token: token.into(),
            config,
        }
    }

    /// First page URL: location filter, sorted by repositories ascending.
    pub fn initial_url(&self) -> Result<String, StreamError> {
        let base = format!("{}/search/users", self.host.trim_end_matches('/'));
        let per_page = self.config.per_page(self.query.cap().get()).to_string();
        let q = format!("location:{} type:user", self.query.location());
        Url::parse_with_params(
            &base,
            [
                ("q", q.as_str()),
                ("sort", "repositories"),
                ("order", "asc"),
                ("per_page", per_page.as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| StreamError::Transport {
            message: format!("invalid search host {:?}: {e}", self.host),
        })
    }

    /// Start the search as a stream producer.
    pub fn into_stream(self, cancel: CancellationToken) -> Stream {
        Stream::new(cancel, move |sink| self.run(sink))
    }

    /// Fetch pages and push users until the cap or the last page.
    pub async fn run(self, sink: Sink) -> Result<(), StreamError> {
        let cap = self.query.cap().get();
        let mut next = Some(self.initial_url()?);
        let mut emitted = 0usize;
        let mut pages = 0usize;

        while emitted < cap {
            let Some(url) = next.take() else {
                break;
            };
            let response = self.fetch(&url, sink.cancellation()).await?;
            let page = decode_page(&response.body)?;
            next = next_page(&response.headers);
            pages += 1;
            log::debug!(
                "{}: page {pages} with {} items (total {:?}), next: {}",
                self.query.location(),
                page.items.len(),
                page.total_count,
                next.is_some()
            );

            for item in page.items.into_iter().take(cap - emitted) {
                sink.push(Record::new(USER_KIND, item)).await?;
                emitted += 1;
            }
        }

        log::info!(
            "{}: {emitted} users from {pages} pages",
            self.query.location()
        );
        Ok(())
    }

    /// GET one page, waiting out the rate limit when the response says so.
    ///
    /// A successful response with no quota left pauses before returning. A
    /// 403/429 with no quota left pauses and re-issues the request, up to
    /// `max_throttle_retries` times.
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, StreamError> {
        let mut throttled = 0u32;
        loop {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                res = self.transport.get(url, &self.token) => res?,
            };
            let limit = RateLimit::from_headers(&response.headers);

            if response.is_success() {
                if let Some(limit) = limit.filter(RateLimit::is_exhausted) {
                    wait_for_reset(&limit, cancel).await?;
                }
                return Ok(response);
            }

            match limit {
                Some(limit)
                    if limit.is_exhausted()
                        && is_throttle_status(response.status)
                        && throttled < self.config.max_throttle_retries =>
                {
                    throttled += 1;
                    log::debug!(
                        "HTTP {} with exhausted quota, attempt {throttled}/{}",
                        response.status,
                        self.config.max_throttle_retries
                    );
                    wait_for_reset(&limit, cancel).await?;
                }
                _ => return Err(status_error(&response)),
            }
        }
    }
}
