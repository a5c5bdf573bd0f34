use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the question-answering backend. Requests go to {url}/ask.
    #[arg(long, env = "BACKEND_URL", default_value = "http://127.0.0.1:8000")]
    pub backend_url: String,

    /// Number of retrieved passages the backend should use per answer.
    #[arg(long, env = "TOP_K", default_value = "4")]
    pub top_k: usize,

    /// Seconds before a backend request is abandoned.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    // --- Rendering Args ---
    /// Prefix for relative image paths returned by the backend.
    #[arg(long, env = "CONTENT_PREFIX", default_value = "/content/images/")]
    pub content_prefix: String,

    /// Maximum number of earlier messages sent back as conversation history.
    #[arg(long, env = "HISTORY_MAX_MESSAGES", default_value = "8")]
    pub history_max_messages: usize,

    // --- Streaming Args ---
    /// Milliseconds between simulated typing ticks.
    #[arg(long, env = "STREAM_INTERVAL_MS", default_value = "18")]
    pub stream_interval_ms: u64,

    /// Characters revealed per tick.
    #[arg(long, env = "STREAM_CHARS_PER_TICK", default_value = "3")]
    pub stream_chars_per_tick: usize,

    /// Seconds of silence before the "Assistant is thinking" hint appears.
    #[arg(long, env = "THINKING_DELAY_SECS", default_value = "7")]
    pub thinking_delay_secs: u64,

    // --- General App Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
