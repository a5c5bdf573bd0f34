//! Simulated typing for assistant answers.
//!
//! The backend returns a whole answer at once. [`StreamState::advance`] reveals
//! it a few chars at a time and derives the segments visible at each step; the
//! async drivers in [`driver`] only pace those steps and publish them.

pub mod driver;

use std::sync::Arc;
use std::time::Duration;

use crate::models::chat::{ Message, Segment };
use crate::render::segments::SegmentComposer;

pub use driver::{ run_stream, run_thinking_timer, MessageSink, MessageTimers, StreamOutcome };

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(18);
pub const DEFAULT_CHARS_PER_TICK: usize = 3;
pub const DEFAULT_THINKING_DELAY: Duration = Duration::from_secs(7);

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub tick_interval: Duration,
    pub chars_per_tick: usize,
    pub thinking_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            chars_per_tick: DEFAULT_CHARS_PER_TICK,
            thinking_delay: DEFAULT_THINKING_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Answer received, nothing revealed yet.
    Idle,
    Streaming,
    Complete,
}

/// Message state published by one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub text: String,
    pub segments: Vec<Segment>,
    pub typing: bool,
    pub complete: bool,
}

impl Frame {
    /// Final frame for a failed request: the error text, shown without streaming.
    pub fn terminal(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            segments: vec![Segment::text(text.clone())],
            text,
            typing: false,
            complete: true,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn apply(&self, message: &mut Message) {
        message.text = self.text.clone();
        message.segments = self.segments.clone();
        message.typing = self.typing;
        if !self.typing {
            message.show_thinking = false;
        }
    }
}

/// Reveal cursor over a fixed answer and its media.
#[derive(Debug, Clone)]
pub struct StreamState {
    composer: Arc<SegmentComposer>,
    cursor: usize,
    phase: StreamPhase,
}

impl StreamState {
    pub fn new(full_text: impl Into<String>, media: Vec<Segment>) -> Self {
        Self {
            composer: Arc::new(SegmentComposer::new(full_text, media)),
            cursor: 0,
            phase: StreamPhase::Idle,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn full_text(&self) -> &str {
        self.composer.full_text()
    }

    pub fn frame(&self) -> Frame {
        let complete = self.phase == StreamPhase::Complete;
        Frame {
            text: self.composer.prefix(self.cursor).to_string(),
            segments: self.composer.compose(self.cursor),
            typing: self.cursor == 0 && !complete,
            complete,
        }
    }

    /// Moves the cursor forward by `step` chars (at least one) and returns the
    /// new state with the frame to publish. A complete state stays put.
    pub fn advance(&self, step: usize) -> (StreamState, Frame) {
        if self.phase == StreamPhase::Complete {
            return (self.clone(), self.frame());
        }
        let total = self.composer.char_len();
        let cursor = (self.cursor + step.max(1)).min(total);
        let phase = if cursor >= total { StreamPhase::Complete } else { StreamPhase::Streaming };
        let next = StreamState {
            composer: Arc::clone(&self.composer),
            cursor,
            phase,
        };
        let frame = next.frame();
        (next, frame)
    }
}
