//! Progress event delivery.
//!
//! The pipeline emits events through an `EventSink` and never waits on
//! consumers. `BroadcastSink` fans events out over a tokio broadcast
//! channel; slow subscribers lose old events rather than slowing the
//! pipeline down.

use riskline_core::{emit_sink_error, ProgressEvent};
use tokio::sync::broadcast;

use crate::error::SinkError;

/// Where progress events go.
///
/// Implementations must not block: `publish` is called inline from the
/// pipeline hot path.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ProgressEvent) -> Result<(), SinkError>;
}

/// Discards every event. Useful for batch runs with no listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: ProgressEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Fan-out sink backed by a tokio broadcast channel.
///
/// Publishing with zero subscribers is a valid state and succeeds; a
/// lagging subscriber sees `RecvError::Lagged` on its receiver instead
/// of backpressuring the sender.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<ProgressEvent>,
}

impl BroadcastSink {
    /// Create a sink whose channel buffers up to `capacity` events per
    /// subscriber before old ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Open a new subscription receiving events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: ProgressEvent) -> Result<(), SinkError> {
        // send errs only when no receiver exists; that is not a failure.
        let _ = self.tx.send(event);
        Ok(())
    }
}

/// Publish an event, logging instead of failing when the sink errs.
/// Progress delivery is best-effort; the pipeline outcome never depends
/// on it.
pub(crate) fn publish_or_warn(sink: &dyn EventSink, event: ProgressEvent) {
    let analysis_id = event.analysis_id.clone();
    if let Err(err) = sink.publish(event) {
        emit_sink_error(&analysis_id.0, &err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskline_core::{AnalysisId, EventStatus, StageName};
    use serde_json::json;

    fn event(message: &str) -> ProgressEvent {
        ProgressEvent::new(
            AnalysisId("job-1".to_string()),
            StageName::Job,
            EventStatus::Started,
            message,
            json!({}),
        )
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscriber() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();

        sink.publish(event("Starting analysis of 2 operation(s)"))
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message, "Starting analysis of 2 operation(s)");
        assert_eq!(received.stage, StageName::Job);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let sink = BroadcastSink::new(8);
        assert_eq!(sink.subscriber_count(), 0);
        assert!(sink.publish(event("no one listening")).is_ok());
    }

    #[tokio::test]
    async fn test_each_subscriber_sees_every_event() {
        let sink = BroadcastSink::new(8);
        let mut a = sink.subscribe();
        let mut b = sink.subscribe();
        assert_eq!(sink.subscriber_count(), 2);

        sink.publish(event("first")).unwrap();
        sink.publish(event("second")).unwrap();

        assert_eq!(a.recv().await.unwrap().message, "first");
        assert_eq!(a.recv().await.unwrap().message, "second");
        assert_eq!(b.recv().await.unwrap().message, "first");
        assert_eq!(b.recv().await.unwrap().message, "second");
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        assert!(NullSink.publish(event("dropped")).is_ok());
    }
}
