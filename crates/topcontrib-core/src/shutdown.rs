//! Graceful shutdown: Ctrl-C cancels the run's token

use tokio_util::sync::CancellationToken;

/// Cancel `token` on the first SIGINT.
///
/// The listener exits once `token` is cancelled by anyone, so callers cancel
/// it after the run to clean up. Must be called inside a runtime.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => {
                    log::warn!("interrupt received, returning partial results");
                    token.cancel();
                }
                Err(e) => log::debug!("cannot listen for ctrl-c: {e}"),
            },
        }
    });
}
