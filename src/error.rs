use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("A question is already being answered")]
    Busy,

    /// The backend answered with `success: false`. Carries the text shown to the user.
    #[error("{0}")]
    Backend(String),

    /// Non-2xx reply whose body could not be decoded. The body is kept for
    /// logging only; it never reaches the chat bubble.
    #[error("Backend returned HTTP {status}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session has been closed")]
    Closed,
}
