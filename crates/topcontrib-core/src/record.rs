//! Dynamic records flowing through a [`Stream`](crate::stream::Stream)

use serde::Serialize;
use serde_json::{Map, Value};

/// Kind tag for records produced by the user search source
pub const USER_KIND: &str = "user";

/// One decoded result item: an ordered field map plus a kind tag.
///
/// Fields keep the order they were decoded in. A record is never mutated
/// after construction; transforms build a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "type")]
    kind: &'static str,
    data: Map<String, Value>,
}

impl Record {
    pub fn new(kind: &'static str, data: Map<String, Value>) -> Self {
        Self { kind, data }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// New record of the same kind holding only `fields`, in the order given.
    ///
    /// Missing fields are skipped.
    pub fn project(&self, fields: &[&str]) -> Self {
        let data = fields
            .iter()
            .filter_map(|&f| self.data.get(f).map(|v| (f.to_string(), v.clone())))
            .collect();
        Self::new(self.kind, data)
    }
}
