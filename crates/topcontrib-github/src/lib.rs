//! Topcontrib GitHub - paginated, rate-limited user search
//!
//! This crate provides the GitHub search source that feeds a
//! [`topcontrib_core::Stream`], plus the `top_results` entry points
//! used by front ends.

pub mod api;
pub mod config;
pub mod error;
pub mod link;
pub mod query;
pub mod rate_limit;
pub mod source;
pub mod user;

// Re-exports
pub use api::{Contrib, GITHUB_API, top_results, top_results_blocking};
pub use config::SearchConfig;
pub use error::ContribError;
pub use query::{CAP_VALUES, Query, ResultCap, ValidationError};
pub use rate_limit::RateLimit;
pub use source::UserSearch;
pub use user::{USER_FIELDS, User, project_user};
