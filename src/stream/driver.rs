use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::{ interval_at, sleep, Instant, MissedTickBehavior };
use tokio_util::sync::CancellationToken;

use super::{ Frame, StreamConfig, StreamState };

/// Where stream frames land. Implementations return `false` once the target
/// message no longer exists, which stops the driver.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn apply_frame(&self, message_id: &str, frame: &Frame) -> bool;

    async fn show_thinking(&self, message_id: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
    /// The message was removed mid-stream.
    Orphaned,
}

/// Cancellation handles for the two timers of one assistant message.
/// Both are children of the owner's token, so cancelling the owner stops them.
#[derive(Debug, Clone)]
pub struct MessageTimers {
    stream: CancellationToken,
    thinking: CancellationToken,
}

impl MessageTimers {
    pub fn new(owner: &CancellationToken) -> Self {
        Self {
            stream: owner.child_token(),
            thinking: owner.child_token(),
        }
    }

    pub fn stream_token(&self) -> CancellationToken {
        self.stream.clone()
    }

    pub fn thinking_token(&self) -> CancellationToken {
        self.thinking.clone()
    }

    pub fn cancel_thinking(&self) {
        self.thinking.cancel();
    }

    pub fn cancel(&self) {
        self.stream.cancel();
        self.thinking.cancel();
    }
}

/// Waits `delay`, then flags the message as still thinking. Returns whether
/// the hint was delivered.
pub async fn run_thinking_timer(
    message_id: String,
    delay: Duration,
    sink: Arc<dyn MessageSink>,
    cancel: CancellationToken
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = sleep(delay) => {
            if cancel.is_cancelled() {
                return false;
            }
            debug!("Message {} still waiting after {:?}", message_id, delay);
            sink.show_thinking(&message_id).await
        }
    }
}

/// Reveals `state` on a fixed interval until the answer is fully shown.
pub async fn run_stream(
    message_id: String,
    mut state: StreamState,
    config: StreamConfig,
    sink: Arc<dyn MessageSink>,
    timers: MessageTimers
) -> StreamOutcome {
    let cancel = timers.stream_token();
    let period = config.tick_interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                timers.cancel_thinking();
                return StreamOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        let (next, frame) = state.advance(config.chars_per_tick);
        state = next;
        if frame.has_content() || frame.complete {
            timers.cancel_thinking();
        }
        if cancel.is_cancelled() {
            return StreamOutcome::Cancelled;
        }
        if !sink.apply_frame(&message_id, &frame).await {
            debug!("Message {} disappeared mid-stream", message_id);
            timers.cancel_thinking();
            return StreamOutcome::Orphaned;
        }
        if frame.complete {
            debug!("Message {} fully revealed ({} chars)", message_id, state.cursor());
            return StreamOutcome::Completed;
        }
    }
}
