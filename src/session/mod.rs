//! One visitor's chat: the conversation, the in-flight request and every
//! timer that still writes into it.

use async_trait::async_trait;
use log::{ debug, info, warn };
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::{ Arc, Mutex as StdMutex };
use tokio::sync::mpsc::{ self, UnboundedReceiver, UnboundedSender };
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::backend::{ answer_text, AskBackend };
use crate::config::ChatSettings;
use crate::error::ChatError;
use crate::history::build_conversation_history;
use crate::models::backend::AskRequest;
use crate::models::chat::{ Conversation, Message };
use crate::render::media_from_answer;
use crate::stream::{ run_stream, run_thinking_timer, Frame, MessageSink, MessageTimers, StreamState };

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A message was added or changed; carries its new state.
    MessageUpdated(Message),
    /// An assistant message reached its final text.
    MessageCompleted {
        id: String,
    },
}

/// Writes frames into the shared conversation and reports each change.
struct ConversationSink {
    conversation: Arc<Mutex<Conversation>>,
    events: UnboundedSender<SessionEvent>,
}

impl ConversationSink {
    fn emit(&self, event: SessionEvent) {
        // A dropped receiver only means nobody is watching any more.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl MessageSink for ConversationSink {
    async fn apply_frame(&self, message_id: &str, frame: &Frame) -> bool {
        // Events go out under the lock, so none can trail a clear.
        let mut conversation = self.conversation.lock().await;
        match conversation.update(message_id, |m| frame.apply(m)) {
            Some(message) => {
                self.emit(SessionEvent::MessageUpdated(message));
                if frame.complete {
                    self.emit(SessionEvent::MessageCompleted { id: message_id.to_string() });
                }
                true
            }
            None => false,
        }
    }

    async fn show_thinking(&self, message_id: &str) -> bool {
        let mut changed = false;
        let mut conversation = self.conversation.lock().await;
        let updated = conversation.update(message_id, |m| {
            if m.typing && !m.show_thinking {
                m.show_thinking = true;
                changed = true;
            }
        });
        match updated {
            Some(message) => {
                if changed {
                    self.emit(SessionEvent::MessageUpdated(message));
                }
                true
            }
            None => false,
        }
    }
}

/// Clears the in-flight flag when a submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ChatSession {
    backend: Arc<dyn AskBackend>,
    settings: ChatSettings,
    conversation: Arc<Mutex<Conversation>>,
    sink: Arc<ConversationSink>,
    in_flight: AtomicBool,
    shutdown: CancellationToken,
    /// Parent of every message timer started since the last clear.
    generation: StdMutex<CancellationToken>,
    tasks: TaskTracker,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn AskBackend>,
        settings: ChatSettings
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let conversation = Arc::new(Mutex::new(Conversation::new()));
        let sink = Arc::new(ConversationSink {
            conversation: Arc::clone(&conversation),
            events,
        });
        let shutdown = CancellationToken::new();
        let generation = StdMutex::new(shutdown.child_token());

        let session = Self {
            backend,
            settings,
            conversation,
            sink,
            in_flight: AtomicBool::new(false),
            shutdown,
            generation,
            tasks: TaskTracker::new(),
        };
        (session, receiver)
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.conversation.lock().await.messages.clone()
    }

    pub async fn conversation_id(&self) -> String {
        self.conversation.lock().await.id.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Timers still alive (streams and thinking hints).
    pub fn pending_timers(&self) -> usize {
        self.tasks.len()
    }

    fn current_generation(&self) -> CancellationToken {
        match self.generation.lock() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Sends `question` to the backend and starts streaming the answer into a
    /// new assistant message. Returns that message's id once the request
    /// finished; the stream itself keeps running in the background.
    pub async fn submit(&self, question: &str) -> Result<String, ChatError> {
        if self.is_closed() {
            return Err(ChatError::Closed);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(ChatError::Busy);
        }
        let _in_flight = InFlight(&self.in_flight);

        let user = Message::user(question);
        let placeholder = Message::assistant_placeholder();
        let assistant_id = placeholder.id.clone();

        let conversation_history = {
            let mut conversation = self.conversation.lock().await;
            let history = build_conversation_history(
                &conversation.messages,
                self.settings.history_max_messages
            );
            conversation.push(user.clone());
            conversation.push(placeholder.clone());
            self.sink.emit(SessionEvent::MessageUpdated(user));
            self.sink.emit(SessionEvent::MessageUpdated(placeholder));
            history
        };

        let timers = MessageTimers::new(&self.current_generation());
        let sink: Arc<dyn MessageSink> = self.sink.clone();
        self.tasks.spawn(
            run_thinking_timer(
                assistant_id.clone(),
                self.settings.thinking_delay,
                Arc::clone(&sink),
                timers.thinking_token()
            )
        );

        let request = AskRequest {
            question: question.to_string(),
            top_k: self.settings.top_k,
            conversation_history,
        };
        info!(
            "Asking backend for {} ({} history entries)",
            assistant_id,
            request.conversation_history.len()
        );

        let answer = self.backend.ask(&request).await.and_then(|response| {
            let text = answer_text(&response)?;
            Ok((text, media_from_answer(&response, &self.settings.content_prefix)))
        });

        match answer {
            Ok((text, media)) => {
                debug!(
                    "Streaming {} chars and {} media items into {}",
                    text.chars().count(),
                    media.len(),
                    assistant_id
                );
                self.tasks.spawn(
                    run_stream(
                        assistant_id.clone(),
                        StreamState::new(text, media),
                        self.settings.stream_config(),
                        sink,
                        timers
                    )
                );
            }
            Err(e) => {
                warn!("Request for {} failed: {}", assistant_id, e);
                timers.cancel();
                if !self.is_closed() {
                    sink.apply_frame(&assistant_id, &Frame::terminal(e.to_string())).await;
                }
            }
        }

        Ok(assistant_id)
    }

    /// Drops every message and stops all timers writing into them. A request
    /// still in flight will find its message gone and discard the answer.
    ///
    /// Events published before this returns may still sit in the receiver;
    /// see [`discard_pending`].
    pub async fn clear(&self) {
        {
            let mut generation = match self.generation.lock() {
                Ok(token) => token,
                Err(poisoned) => poisoned.into_inner(),
            };
            generation.cancel();
            *generation = self.shutdown.child_token();
        }
        self.conversation.lock().await.clear();
        info!("Conversation cleared");
    }

    /// Stops every timer. Further submissions fail with [`ChatError::Closed`].
    pub fn close(&self) {
        self.shutdown.cancel();
        self.tasks.close();
    }

    /// Like [`close`](Self::close), then waits for the timers to wind down.
    pub async fn shutdown(&self) {
        self.close();
        self.tasks.wait().await;
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Drops every event already queued on `events`. Called right after
/// [`ChatSession::clear`] so no update for a removed message is relayed.
pub fn discard_pending(events: &mut UnboundedReceiver<SessionEvent>) -> usize {
    let mut dropped = 0;
    while events.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}
