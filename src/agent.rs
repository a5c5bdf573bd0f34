use log::info;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::backend::{ new_backend, AskBackend };
use crate::config::ChatSettings;
use crate::error::ChatError;
use crate::session::{ ChatSession, SessionEvent };

/// Shared entry point: holds the backend client and hands out one session
/// per visitor.
#[derive(Clone)]
pub struct ChatAgent {
    backend: Arc<dyn AskBackend>,
    settings: ChatSettings,
}

impl ChatAgent {
    pub fn new(settings: ChatSettings) -> Result<Self, ChatError> {
        let backend = new_backend(&settings)?;
        info!("Chat backend configured at {}", settings.backend_url);
        Ok(Self::with_backend(backend, settings))
    }

    pub fn with_backend(backend: Arc<dyn AskBackend>, settings: ChatSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn open_session(&self) -> (ChatSession, UnboundedReceiver<SessionEvent>) {
        ChatSession::new(Arc::clone(&self.backend), self.settings.clone())
    }
}
