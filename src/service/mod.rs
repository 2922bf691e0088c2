//! Turn orchestration: the end-to-end flow for one user turn.
//!
//! authorize → (lazily create thread) → persist user message → emitter →
//! tee → reconcile → guard → upsert. The streaming/persistence work runs in
//! a detached task: dropping the [`TurnHandle`] (client disconnect) never
//! cancels capture or the final write.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::auth::{Authorizer, RequestContext};
use crate::config::WeirConfig;
use crate::emitter::TurnEmitter;
use crate::error::{Result, WeirError};
use crate::model::ChatModel;
use crate::reconcile::guard::guard_message;
use crate::reconcile::ReconcileBuffer;
use crate::store::MessageStore;
use crate::tee::{ChannelSink, StreamTee};
use crate::tools::ToolRegistry;
use crate::types::{ChatMessage, Thread, TurnEvent};

/// One incoming user turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub context: RequestContext,
    /// Existing thread to continue, or `None` to start a new one.
    pub thread_id: Option<String>,
    /// The user's input text.
    pub text: String,
}

/// Handle for an in-flight turn.
///
/// Receiving on `events` is the live branch; dropping or ignoring it only
/// disconnects the client view. `wait` resolves once the assistant message
/// has been durably written (or the final write failed).
#[derive(Debug)]
pub struct TurnHandle {
    thread_id: String,
    message_id: String,
    events: Option<mpsc::UnboundedReceiver<TurnEvent>>,
    done: oneshot::Receiver<Result<ChatMessage>>,
}

impl TurnHandle {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// The id the assistant message will be persisted under.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Next live event, or `None` once the stream ends (or after
    /// [`disconnect`](Self::disconnect)).
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        match &mut self.events {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Take the live branch as a stream (for wiring into a response body).
    pub fn take_events(&mut self) -> Option<UnboundedReceiverStream<TurnEvent>> {
        self.events.take().map(UnboundedReceiverStream::new)
    }

    /// Simulate/perform client disconnect: stop consuming live events. The
    /// background turn keeps running to completion.
    pub fn disconnect(&mut self) {
        self.events = None;
    }

    /// Wait for the turn to finish and the final message to be persisted.
    /// A turn task torn down before completion (runtime shutdown) surfaces
    /// as a stream error.
    pub async fn wait(self) -> Result<ChatMessage> {
        self.done.await.unwrap_or_else(|_| {
            Err(WeirError::Stream(
                "turn task dropped before completion".into(),
            ))
        })
    }
}

/// Entry point tying the engine's pieces together.
pub struct TurnService {
    model: Arc<dyn ChatModel>,
    registry: Arc<ToolRegistry>,
    store: Arc<dyn MessageStore>,
    authorizer: Arc<dyn Authorizer>,
    config: WeirConfig,
}

impl TurnService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: Arc<ToolRegistry>,
        store: Arc<dyn MessageStore>,
        authorizer: Arc<dyn Authorizer>,
        config: WeirConfig,
    ) -> Self {
        Self {
            model,
            registry,
            store,
            authorizer,
            config,
        }
    }

    /// Submit one user turn. Persists the user message immediately, then
    /// spawns the detached streaming task and returns its handle.
    pub async fn submit(&self, request: TurnRequest) -> Result<TurnHandle> {
        let user = self.authorizer.authorize(&request.context).await?;

        let thread = match &request.thread_id {
            Some(id) => match self.store.get_thread(id).await? {
                Some(thread) if thread.user_id == user.user_id => thread,
                Some(_) => {
                    return Err(WeirError::Unauthorized(format!(
                        "thread {id} belongs to another user"
                    )))
                }
                None => {
                    // Lazily created under the client-supplied id.
                    let thread = Thread {
                        id: id.clone(),
                        user_id: user.user_id.clone(),
                        created_at: Utc::now(),
                    };
                    self.store.upsert_thread(&thread).await?;
                    thread
                }
            },
            None => {
                let thread = Thread::new(&user.user_id);
                self.store.upsert_thread(&thread).await?;
                thread
            }
        };

        let user_message = ChatMessage::user(&thread.id, request.text);
        self.store.upsert(&user_message).await?;

        let history = self
            .store
            .select_by_thread(&thread.id, self.config.history_limit)
            .await?;

        let message_id = Uuid::new_v4().to_string();
        let (live_tx, live_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();

        let emitter = TurnEmitter::new(self.model.clone(), self.registry.clone(), self.config.clone());
        let events = emitter.stream(thread.id.clone(), history);
        let buffer = ReconcileBuffer::new(&thread.id, &message_id);
        let store = self.store.clone();
        let checkpoint_interval = Duration::from_millis(self.config.checkpoint_interval_ms);
        let thread_id = thread.id.clone();
        let handle_message_id = message_id.clone();

        // Detached continuation: the turn outlives the client connection.
        tokio::spawn(async move {
            let tee = StreamTee::new(Box::new(ChannelSink::new(live_tx)), buffer, checkpoint_interval);
            let checkpoint_store = store.clone();
            let buffer = tee
                .run(events, move |snapshot| {
                    let store = checkpoint_store.clone();
                    async move {
                        let guarded = guard_message(snapshot);
                        if let Err(err) = store.upsert(&guarded).await {
                            // Retried implicitly at the next checkpoint; only
                            // the final upsert failure fails the turn.
                            tracing::warn!(
                                message_id = %guarded.id,
                                error = %err,
                                "checkpoint upsert failed"
                            );
                        }
                    }
                })
                .await;

            let message = guard_message(buffer.finalize());
            let result = match store.upsert(&message).await {
                Ok(()) => Ok(message),
                Err(err) => {
                    tracing::error!(
                        thread_id = %message.thread_id,
                        message_id = %message.id,
                        error = %err,
                        "final message upsert failed"
                    );
                    Err(err)
                }
            };
            let _ = done_tx.send(result);
        });

        Ok(TurnHandle {
            thread_id,
            message_id: handle_message_id,
            events: Some(live_rx),
            done: done_rx,
        })
    }
}
