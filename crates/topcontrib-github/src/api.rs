//! Entry points: "top users for this location"

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use topcontrib_core::{HttpConfig, Record, ReqwestTransport, SHARED_RUNTIME, Stream, Transport};

use crate::config::SearchConfig;
use crate::error::ContribError;
use crate::query::Query;
use crate::source::UserSearch;
use crate::user::project_user;

/// Public GitHub API host
pub const GITHUB_API: &str = "https://api.github.com";

/// Search client bound to one host and credential.
///
/// Owns its transport; nothing is shared between clients.
pub struct Contrib {
    transport: Arc<dyn Transport>,
    host: String,
    token: String,
    config: SearchConfig,
}

impl Contrib {
    pub fn new(
        transport: Arc<dyn Transport>,
        host: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            host: host.into(),
            token: token.into(),
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Raw user records for an already validated query.
    pub fn stream(&self, query: Query, cancel: CancellationToken) -> Stream {
        UserSearch::new(
            self.transport.clone(),
            query,
            self.host.clone(),
            self.token.clone(),
            self.config.clone(),
        )
        .into_stream(cancel)
    }

    /// Validate, fetch and project up to the cap.
    ///
    /// Cancellation returns the records collected so far without error. On
    /// failure the partial records are dropped and only the error is returned.
    pub async fn top_results(
        &self,
        location: &str,
        cap_token: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<Record>, ContribError> {
        let query = Query::parse(location, cap_token)?;
        let drained = self.stream(query, cancel).map(project_user).subscribe().await;
        if let Some(e) = &drained.error {
            log::debug!("discarding {} partial records: {e}", drained.records.len());
        }
        Ok(drained.into_result()?)
    }
}

/// One-shot query with its own cancellation scope.
pub async fn top_results(
    transport: Arc<dyn Transport>,
    location: &str,
    cap_token: &str,
    host: &str,
    token: &str,
) -> Result<Vec<Record>, ContribError> {
    let cancel = CancellationToken::new();
    // Stops the producer if this future is dropped mid-drain.
    let _guard = cancel.clone().drop_guard();
    Contrib::new(transport, host, token)
        .top_results(location, cap_token, cancel)
        .await
}

/// Blocking variant for synchronous callers, using a fresh reqwest transport.
///
/// Validation runs first, so invalid input never builds a client.
pub fn top_results_blocking(
    location: &str,
    cap_token: &str,
    host: &str,
    token: &str,
) -> Result<Vec<Record>, ContribError> {
    Query::parse(location, cap_token)?;
    let transport = Arc::new(ReqwestTransport::new(&HttpConfig::default())?);
    SHARED_RUNTIME
        .handle()
        .block_on(top_results(transport, location, cap_token, host, token))
}
