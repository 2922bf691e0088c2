//! Stream tee: one event sequence, two consumers.
//!
//! The live branch is best-effort delivery to the requesting client; the
//! buffered branch feeds the [`ReconcileBuffer`] synchronously, in emission
//! order, and is the record of truth. A disconnected client never aborts
//! accumulation, and a terminal upstream error still lets the buffered side
//! finalize whatever partial state it holds.

use std::future::Future;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::reconcile::ReconcileBuffer;
use crate::types::{ChatMessage, TurnEvent};

/// Best-effort delivery to a live client.
pub trait LiveSink: Send {
    /// Deliver one event. Returns `false` once the client is gone; the tee
    /// stops writing to this sink but keeps buffering.
    fn send(&mut self, event: &TurnEvent) -> bool;
}

/// Live sink over an unbounded channel (e.g. backing an SSE response task).
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TurnEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<TurnEvent>) -> Self {
        Self { tx }
    }
}

impl LiveSink for ChannelSink {
    fn send(&mut self, event: &TurnEvent) -> bool {
        self.tx.send(event.clone()).is_ok()
    }
}

/// Sink for turns with no live consumer.
pub struct NullSink;

impl LiveSink for NullSink {
    fn send(&mut self, _event: &TurnEvent) -> bool {
        true
    }
}

/// Duplicates a turn's event stream to a live sink and a reconcile buffer.
pub struct StreamTee {
    live: Box<dyn LiveSink>,
    buffer: ReconcileBuffer,
    checkpoint_interval: Duration,
    client_connected: bool,
}

impl StreamTee {
    /// `checkpoint_interval` throttles mid-stream snapshot persistence; zero
    /// disables checkpoints.
    pub fn new(
        live: Box<dyn LiveSink>,
        buffer: ReconcileBuffer,
        checkpoint_interval: Duration,
    ) -> Self {
        Self {
            live,
            buffer,
            checkpoint_interval,
            client_connected: true,
        }
    }

    /// Drive the event stream to completion, returning the buffer for
    /// finalization. `checkpoint` receives throttled snapshots of the
    /// growing message (same id each time; the upsert must be idempotent).
    pub async fn run<F, Fut>(
        mut self,
        mut events: BoxStream<'static, TurnEvent>,
        mut checkpoint: F,
    ) -> ReconcileBuffer
    where
        F: FnMut(ChatMessage) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut last_checkpoint = tokio::time::Instant::now();

        while let Some(event) = events.next().await {
            // Buffered branch first: it must observe every event even if the
            // live write below is the last thing this task ever does.
            self.buffer.observe(&event);

            if self.client_connected && !self.live.send(&event) {
                self.client_connected = false;
                tracing::debug!(
                    thread_id = %self.buffer.thread_id(),
                    message_id = %self.buffer.message_id(),
                    "live sink closed; continuing buffered capture"
                );
            }

            if event.is_terminal() {
                break;
            }

            if !self.checkpoint_interval.is_zero()
                && last_checkpoint.elapsed() >= self.checkpoint_interval
            {
                checkpoint(self.buffer.snapshot()).await;
                last_checkpoint = tokio::time::Instant::now();
            }
        }

        self.buffer
    }
}
