use std::time::Duration;

use crate::cli::Args;
use crate::history::DEFAULT_MAX_HISTORY_MESSAGES;
use crate::render::media::DEFAULT_CONTENT_PREFIX;
use crate::stream::{ StreamConfig, DEFAULT_CHARS_PER_TICK, DEFAULT_THINKING_DELAY, DEFAULT_TICK_INTERVAL };

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Runtime settings for chat sessions.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub backend_url: String,
    /// Prepended to relative image paths.
    pub content_prefix: String,
    pub top_k: usize,
    pub history_max_messages: usize,
    pub tick_interval: Duration,
    pub chars_per_tick: usize,
    pub thinking_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            content_prefix: DEFAULT_CONTENT_PREFIX.to_string(),
            top_k: DEFAULT_TOP_K,
            history_max_messages: DEFAULT_MAX_HISTORY_MESSAGES,
            tick_interval: DEFAULT_TICK_INTERVAL,
            chars_per_tick: DEFAULT_CHARS_PER_TICK,
            thinking_delay: DEFAULT_THINKING_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ChatSettings {
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            tick_interval: self.tick_interval,
            chars_per_tick: self.chars_per_tick.max(1),
            thinking_delay: self.thinking_delay,
        }
    }
}

impl From<&Args> for ChatSettings {
    fn from(args: &Args) -> Self {
        Self {
            backend_url: args.backend_url.clone(),
            content_prefix: args.content_prefix.clone(),
            top_k: args.top_k,
            history_max_messages: args.history_max_messages,
            tick_interval: Duration::from_millis(args.stream_interval_ms),
            chars_per_tick: args.stream_chars_per_tick,
            thinking_delay: Duration::from_secs(args.thinking_delay_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        }
    }
}
