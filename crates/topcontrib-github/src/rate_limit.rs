//! Rate-limit signal carried on every GitHub response

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;

use topcontrib_core::{StreamError, header_str};

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Remaining quota and when it refills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: u64,
    /// `None` when the reset header is absent or unparsable
    pub reset_at: Option<SystemTime>,
}

impl RateLimit {
    /// Read the signal; `None` if the remaining-quota header is missing or not a number.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_str(headers, REMAINING_HEADER)?.trim().parse().ok()?;
        let reset_at = header_str(headers, RESET_HEADER)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
        Some(Self {
            remaining,
            reset_at,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// How long to pause at `now`. `None` when quota is left or the reset already passed.
    pub fn pause_at(&self, now: SystemTime) -> Option<Duration> {
        if !self.is_exhausted() {
            return None;
        }
        self.reset_at?
            .duration_since(now)
            .ok()
            .filter(|d| !d.is_zero())
    }
}

/// Sleep until the quota resets, waking early on cancellation.
///
/// Returns the time actually scheduled to wait.
pub async fn wait_for_reset(
    limit: &RateLimit,
    cancel: &CancellationToken,
) -> Result<Duration, StreamError> {
    if limit.is_exhausted() && limit.reset_at.is_none() {
        log::warn!("rate limit exhausted but no usable {RESET_HEADER} header, not pausing");
        return Ok(Duration::ZERO);
    }
    let Some(wait) = limit.pause_at(SystemTime::now()) else {
        return Ok(Duration::ZERO);
    };

    log::warn!(
        "rate limit exhausted, pausing {:.1}s until reset",
        wait.as_secs_f64()
    );
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StreamError::Cancelled),
        _ = tokio::time::sleep(wait) => Ok(wait),
    }
}
