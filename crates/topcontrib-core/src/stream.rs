//! Single-producer, single-consumer record stream.
//!
//! A producer task feeds records through a bounded handoff queue; optional
//! map stages run as their own tasks; `subscribe` drains the tail into a
//! `Vec`. All stages share one cancellation token and one error slot.
//!
//! Must be created from within a tokio runtime.

use std::any::Any;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;
use crate::record::Record;

/// Records in flight between two stages
const HANDOFF_CAPACITY: usize = 1;

/// Producer-side handle of a [`Stream`].
pub struct Sink {
    tx: mpsc::Sender<Record>,
    cancel: CancellationToken,
}

impl Sink {
    /// Hand one record downstream.
    ///
    /// Waits while the queue is full and returns once the record is queued,
    /// so one record may sit between stages. Returns
    /// [`StreamError::Cancelled`] once the token fires or the consumer is
    /// gone; the record is dropped.
    ///
    /// A record queued before cancellation is still delivered by
    /// [`Stream::subscribe`] when it is on the last stage. A map stage stops
    /// pulling on cancellation, so a record queued ahead of it is dropped.
    pub async fn push(&self, record: Record) -> Result<(), StreamError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StreamError::Cancelled),
            sent = self.tx.send(record) => sent.map_err(|_| StreamError::Cancelled),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Result of draining a stream.
#[derive(Debug, Default)]
pub struct Drained {
    /// Records received before the stream ended, in production order
    pub records: Vec<Record>,
    /// Terminal producer or transform error. `None` on normal close or cancellation.
    pub error: Option<StreamError>,
}

impl Drained {
    /// Drop the partial records if the stream failed
    pub fn into_result(self) -> Result<Vec<Record>, StreamError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.records),
        }
    }
}

/// Live conduit of [`Record`]s with an error slot and a cancellation token.
pub struct Stream {
    records: mpsc::Receiver<Record>,
    errors: mpsc::Receiver<StreamError>,
    error_slot: mpsc::Sender<StreamError>,
    cancel: CancellationToken,
}

/// Store the first terminal error; later ones are logged and dropped.
fn report(slot: &mpsc::Sender<StreamError>, err: StreamError) {
    if err.is_cancelled() {
        return;
    }
    if let Err(mpsc::error::TrySendError::Full(dropped)) = slot.try_send(err) {
        log::debug!("error slot already filled, dropping: {dropped}");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn join_failure(stage: &str, e: JoinError) -> StreamError {
    match e.try_into_panic() {
        Ok(payload) => {
            StreamError::Transform(format!("{stage} panicked: {}", panic_message(&*payload)))
        }
        Err(e) => StreamError::Transform(format!("{stage} aborted: {e}")),
    }
}

/// Run `work` as its own task and report its outcome to the error slot.
///
/// A panic in `work` is reported as [`StreamError::Transform`]. `hold_open`
/// is a sender of the stage's output queue; it drops only after the outcome
/// is in the slot, so the next stage never observes closure without the
/// error.
fn spawn_stage<Fut>(
    stage: &'static str,
    slot: mpsc::Sender<StreamError>,
    hold_open: mpsc::Sender<Record>,
    work: Fut,
) where
    Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = tokio::spawn(work)
            .await
            .unwrap_or_else(|e| Err(join_failure(stage, e)));
        match outcome {
            Ok(()) => log::debug!("{stage} finished"),
            Err(e) if e.is_cancelled() => log::debug!("{stage} cancelled"),
            Err(e) => {
                log::debug!("{stage} failed: {e}");
                report(&slot, e);
            }
        }
        drop(hold_open);
    });
}

/// Body of one map stage: pull, apply `f`, forward, until upstream closes.
async fn run_map<F>(
    mut f: F,
    token: CancellationToken,
    mut upstream: mpsc::Receiver<Record>,
    tx: mpsc::Sender<Record>,
) -> Result<(), StreamError>
where
    F: FnMut(&CancellationToken, Record) -> Result<Record, StreamError>,
{
    loop {
        let record = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            next = upstream.recv() => match next {
                Some(record) => record,
                None => return Ok(()),
            },
        };
        let mapped = f(&token, record)?;
        let forwarded = tokio::select! {
            biased;
            _ = token.cancelled() => false,
            sent = tx.send(mapped) => sent.is_ok(),
        };
        if !forwarded {
            return Ok(());
        }
    }
}

impl Stream {
    /// Spawn `producer` and return the stream it feeds.
    ///
    /// The stream is closed when the producer returns. A returned error, or a
    /// panic, is stored in the error slot before closing.
    pub fn new<F, Fut>(cancel: CancellationToken, producer: F) -> Self
    where
        F: FnOnce(Sink) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), StreamError>> + Send + 'static,
    {
        let (tx, records) = mpsc::channel(HANDOFF_CAPACITY);
        let (error_slot, errors) = mpsc::channel(1);

        let hold_open = tx.clone();
        let sink = Sink {
            tx,
            cancel: cancel.clone(),
        };
        spawn_stage("producer", error_slot.clone(), hold_open, async move {
            producer(sink).await
        });

        Self {
            records,
            errors,
            error_slot,
            cancel,
        }
    }

    /// Derive a stream whose records are `f` applied to each upstream record.
    ///
    /// `f` runs on its own task. An error or a panic ends the derived stream
    /// and lands in the shared error slot. On cancellation the stage stops
    /// pulling upstream.
    pub fn map<F>(self, f: F) -> Self
    where
        F: FnMut(&CancellationToken, Record) -> Result<Record, StreamError> + Send + 'static,
    {
        let Self {
            records: upstream,
            errors,
            error_slot,
            cancel,
        } = self;

        let (tx, records) = mpsc::channel(HANDOFF_CAPACITY);
        let hold_open = tx.clone();
        spawn_stage(
            "map stage",
            error_slot.clone(),
            hold_open,
            run_map(f, cancel.clone(), upstream, tx),
        );

        Self {
            records,
            errors,
            error_slot,
            cancel,
        }
    }

    /// Collect records until the stream closes, fails or is cancelled.
    ///
    /// On cancellation, records already queued on this stage are kept.
    /// Consume-once: calling again after a drain returns an empty result.
    pub async fn subscribe(&mut self) -> Drained {
        let mut records = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.records.close();
                    while let Ok(record) = self.records.try_recv() {
                        records.push(record);
                    }
                    return Drained { records, error: None };
                }
                next = self.records.recv() => match next {
                    Some(record) => records.push(record),
                    None => {
                        let error = self.errors.try_recv().ok();
                        return Drained { records, error };
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::{Map, Value, json};
    use tokio::sync::oneshot;

    use super::*;
    use crate::record::USER_KIND;

    fn rec(id: u64) -> Record {
        let mut data = Map::new();
        data.insert("id".to_string(), json!(id));
        Record::new(USER_KIND, data)
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_u64))
            .collect()
    }

    #[tokio::test]
    async fn drains_in_order() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            for i in 0..5 {
                sink.push(rec(i)).await?;
            }
            Ok(())
        });
        let drained = stream.subscribe().await;
        assert!(drained.error.is_none());
        assert_eq!(ids(&drained.records), [0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn empty_producer_closes() {
        let mut stream = Stream::new(CancellationToken::new(), |_sink| async { Ok(()) });
        let drained = stream.subscribe().await;
        assert!(drained.records.is_empty());
        assert!(drained.error.is_none());
    }

    #[tokio::test]
    async fn producer_error_returned_with_partial_records() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            sink.push(rec(1)).await?;
            sink.push(rec(2)).await?;
            Err(StreamError::Status {
                status: 400,
                message: "Bad Request".to_string(),
            })
        });
        let drained = stream.subscribe().await;
        assert_eq!(ids(&drained.records), [1, 2]);
        assert_eq!(drained.error.and_then(|e| e.status()), Some(400));
    }

    #[tokio::test]
    async fn into_result_discards_partial_records() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            sink.push(rec(1)).await?;
            Err(StreamError::Decode("bad".to_string()))
        });
        let result = stream.subscribe().await.into_result();
        assert_eq!(result.unwrap_err(), StreamError::Decode("bad".to_string()));
    }

    #[tokio::test]
    async fn second_subscribe_is_empty() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            sink.push(rec(1)).await?;
            Err(StreamError::Decode("bad".to_string()))
        });
        let first = stream.subscribe().await;
        assert_eq!(first.records.len(), 1);
        assert!(first.error.is_some());

        let second = stream.subscribe().await;
        assert!(second.records.is_empty());
        assert!(second.error.is_none());
    }

    #[tokio::test]
    async fn map_transforms_each_record() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            for i in 0..3 {
                sink.push(rec(i)).await?;
            }
            Ok(())
        })
        .map(|_, r| {
            let id = r.get("id").and_then(Value::as_u64).unwrap_or_default();
            Ok(rec(id * 10))
        });
        let drained = stream.subscribe().await;
        assert!(drained.error.is_none());
        assert_eq!(ids(&drained.records), [0, 10, 20]);
    }

    #[tokio::test]
    async fn map_error_terminates_derived_stream() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            for i in 0..10 {
                sink.push(rec(i)).await?;
            }
            Ok(())
        })
        .map(|_, r| match r.get("id").and_then(Value::as_u64) {
            Some(2) => Err(StreamError::Transform("id 2 rejected".to_string())),
            _ => Ok(r),
        });
        let drained = stream.subscribe().await;
        assert_eq!(ids(&drained.records), [0, 1]);
        assert_eq!(
            drained.error,
            Some(StreamError::Transform("id 2 rejected".to_string()))
        );
    }

    #[tokio::test]
    async fn producer_error_passes_through_map() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            sink.push(rec(7)).await?;
            Err(StreamError::Transport {
                message: "reset".to_string(),
            })
        })
        .map(|_, r| Ok(r.project(&["id"])));
        let drained = stream.subscribe().await;
        assert_eq!(ids(&drained.records), [7]);
        assert!(matches!(drained.error, Some(StreamError::Transport { .. })));
    }

    #[tokio::test]
    async fn map_panic_lands_in_error_slot() {
        let mut stream = Stream::new(CancellationToken::new(), |sink| async move {
            for i in 0..5 {
                sink.push(rec(i)).await?;
            }
            Ok(())
        })
        .map(|_, r| {
            if r.get("id").and_then(Value::as_u64) == Some(2) {
                panic!("bad record");
            }
            Ok(r)
        });
        let drained = stream.subscribe().await;
        assert_eq!(ids(&drained.records), [0, 1]);
        match drained.error {
            Some(StreamError::Transform(msg)) => {
                assert!(msg.contains("panicked"), "{msg}");
                assert!(msg.contains("bad record"), "{msg}");
            }
            other => panic!("expected transform error, got {other:?}"),
        }
    }

    async fn panicking_producer(sink: Sink) -> Result<(), StreamError> {
        sink.push(rec(1)).await?;
        panic!("lost connection state")
    }

    #[tokio::test]
    async fn producer_panic_lands_in_error_slot() {
        let mut stream = Stream::new(CancellationToken::new(), panicking_producer);
        let drained = stream.subscribe().await;
        assert_eq!(ids(&drained.records), [1]);
        assert!(matches!(drained.error, Some(StreamError::Transform(_))));
    }

    #[tokio::test]
    async fn cancel_keeps_record_already_queued() {
        let token = CancellationToken::new();
        let (queued_tx, queued_rx) = oneshot::channel();
        let mut stream = Stream::new(token.clone(), move |sink| async move {
            sink.push(rec(1)).await?;
            let _ = queued_tx.send(());
            sink.cancellation().cancelled().await;
            Ok(())
        });

        queued_rx.await.unwrap();
        token.cancel();

        let drained = stream.subscribe().await;
        assert!(drained.error.is_none());
        assert_eq!(ids(&drained.records), [1]);
    }

    #[tokio::test]
    async fn cancel_mid_drain_returns_partial_without_error() {
        let token = CancellationToken::new();
        let (done_tx, done_rx) = oneshot::channel();
        let mut stream = Stream::new(token.clone(), move |sink| async move {
            for i in 0..3 {
                sink.push(rec(i)).await?;
            }
            sink.cancellation().cancelled().await;
            let after = sink.push(rec(99)).await;
            let _ = done_tx.send(after);
            Ok(())
        });

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let drained = stream.subscribe().await;
        assert!(drained.error.is_none());
        assert_eq!(ids(&drained.records), [0, 1, 2]);
        assert_eq!(done_rx.await.unwrap(), Err(StreamError::Cancelled));
    }

    #[tokio::test]
    async fn cancel_stops_map_stage() {
        let token = CancellationToken::new();
        let mapped = Arc::new(AtomicUsize::new(0));
        let counter = mapped.clone();
        let mut stream = Stream::new(token.clone(), |sink| async move {
            let mut i = 0;
            loop {
                sink.push(rec(i)).await?;
                i += 1;
            }
        })
        .map(move |token, r| {
            if counter.fetch_add(1, Ordering::SeqCst) == 4 {
                token.cancel();
            }
            Ok(r)
        });

        let drained = stream.subscribe().await;
        assert!(drained.error.is_none());
        assert!(drained.records.len() <= 4);
        assert_eq!(ids(&drained.records), (0..drained.records.len() as u64).collect::<Vec<_>>());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(mapped.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn push_waits_for_consumer() {
        let pushed = Arc::new(AtomicUsize::new(0));
        let counter = pushed.clone();
        let mut stream = Stream::new(CancellationToken::new(), move |sink| async move {
            for i in 0..10 {
                sink.push(rec(i)).await?;
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(pushed.load(Ordering::SeqCst) <= HANDOFF_CAPACITY);

        let drained = stream.subscribe().await;
        assert_eq!(drained.records.len(), 10);
        assert_eq!(pushed.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn dropped_stream_unblocks_producer() {
        let (done_tx, done_rx) = oneshot::channel();
        let stream = Stream::new(CancellationToken::new(), move |sink| async move {
            let mut result = Ok(());
            for i in 0..10 {
                result = sink.push(rec(i)).await;
                if result.is_err() {
                    break;
                }
            }
            let _ = done_tx.send(result);
            Ok(())
        });
        drop(stream);
        assert_eq!(done_rx.await.unwrap(), Err(StreamError::Cancelled));
    }
}
