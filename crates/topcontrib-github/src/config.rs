//! User search configuration

/// Largest `per_page` the search endpoint accepts
pub const MAX_PER_PAGE: usize = 100;

/// Default number of pauses allowed on rate-limited (403/429) responses per page
pub const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 3;

/// Tuning for [`UserSearch`](crate::source::UserSearch)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Times a rate-limited rejection may be waited out and re-issued
    pub max_throttle_retries: u32,
    /// Upper bound for `per_page`
    pub per_page_max: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
            per_page_max: MAX_PER_PAGE,
        }
    }
}

impl SearchConfig {
    /// Page size for a query capped at `cap`
    pub fn per_page(&self, cap: usize) -> usize {
        cap.min(self.per_page_max).max(1)
    }
}
