pub mod http;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ChatSettings;
use crate::error::ChatError;
use crate::models::backend::{ AskRequest, AskResponse };

pub use self::http::HttpAskBackend;

const DEFAULT_ANSWER: &str = "No answer available.";
const DEFAULT_FAILURE: &str = "Error from assistant";

/// Question-answering service behind the chat.
#[async_trait]
pub trait AskBackend: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ChatError>;
}

pub fn new_backend(settings: &ChatSettings) -> Result<Arc<dyn AskBackend>, ChatError> {
    Ok(Arc::new(HttpAskBackend::from_settings(settings)?))
}

/// Text to stream for a decoded response. A `success: false` reply becomes
/// [`ChatError::Backend`] carrying the backend's detail.
pub fn answer_text(response: &AskResponse) -> Result<String, ChatError> {
    if !response.success {
        let detail = response
            .failure_detail()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE.to_string());
        return Err(ChatError::Backend(detail));
    }
    Ok(
        response.answer
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_ANSWER.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AskResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn successful_answer_is_returned() {
        let r = response(json!({ "success": true, "answer": "Reset it from settings." }));
        assert_eq!(answer_text(&r).unwrap(), "Reset it from settings.");
    }

    #[test]
    fn missing_answer_gets_placeholder_text() {
        let r = response(json!({ "success": true, "answer": "" }));
        assert_eq!(answer_text(&r).unwrap(), "No answer available.");
        let r = response(json!({ "success": true }));
        assert_eq!(answer_text(&r).unwrap(), "No answer available.");
    }

    #[test]
    fn failure_uses_detail_or_default() {
        let r = response(json!({ "success": false, "detail": "rate limited" }));
        assert_eq!(answer_text(&r).unwrap_err().to_string(), "rate limited");
        let r = response(json!({ "success": false }));
        assert_eq!(answer_text(&r).unwrap_err().to_string(), "Error from assistant");
    }
}
