//! Topcontrib Core - Record stream pipeline and HTTP plumbing
//!
//! This crate provides the concurrent stream primitive (producer, map
//! stages, drain) and the transport seam that paginated sources use to
//! reach the network.

pub mod error;
pub mod http;
pub mod logging;
pub mod progress;
pub mod record;
pub mod shutdown;
pub mod stream;

// Re-exports for convenience
pub use error::StreamError;
pub use http::{HttpConfig, HttpResponse, ReqwestTransport, Transport, header_str};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, count_records, fmt_num};
pub use record::{Record, USER_KIND};
pub use shutdown::cancel_on_ctrl_c;
pub use stream::{Drained, Sink, Stream};

/// Shared tokio runtime for blocking callers.
///
/// Async callers should use their own runtime; this exists so a synchronous
/// front end can drive a stream without owning one.
pub static SHARED_RUNTIME: std::sync::LazyLock<tokio::runtime::Runtime> =
    std::sync::LazyLock::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to build tokio runtime")
    });

pub use tokio_util::sync::CancellationToken;
