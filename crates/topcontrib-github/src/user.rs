//! Projection of raw search items down to the fields callers use

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use topcontrib_core::{Record, StreamError};

/// Fields kept by [`project_user`], in output order
pub const USER_FIELDS: [&str; 4] = ["id", "url", "type", "score"];

/// Map stage: keep only [`USER_FIELDS`].
pub fn project_user(_cancel: &CancellationToken, record: Record) -> Result<Record, StreamError> {
    Ok(record.project(&USER_FIELDS))
}

/// Typed view of a user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub url: String,
    #[serde(rename = "type")]
    pub user_type: String,
    pub score: f64,
}

impl User {
    /// `None` if a field is missing or has the wrong type
    pub fn from_record(record: &Record) -> Option<Self> {
        serde_json::from_value(Value::Object(record.data().clone())).ok()
    }
}
