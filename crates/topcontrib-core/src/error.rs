//! Error type shared by stream producers, transforms and transports

/// Terminal error of a [`Stream`](crate::stream::Stream).
///
/// Producer and transform failures all funnel into one error slot per
/// stream; the drain is the only place that hands it to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Request construction or network failure
    Transport { message: String },
    /// Non-success HTTP status
    Status { status: u16, message: String },
    /// Malformed response body
    Decode(String),
    /// A map stage rejected a record
    Transform(String),
    /// Cancellation observed while pushing, pausing or fetching.
    ///
    /// Never stored in the error slot.
    Cancelled,
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "HTTP error: {message}"),
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Transform(msg) => write!(f, "transform error: {msg}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for StreamError {}

impl StreamError {
    /// Create transport error from reqwest error.
    ///
    /// The URL is stripped so tokens in query strings never reach logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self::Transport {
            message: e.without_url().to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
