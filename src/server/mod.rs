pub mod websocket;

use crate::agent::ChatAgent;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    agent: Arc<ChatAgent>,
}

impl Server {
    pub fn new(addr: String, agent: Arc<ChatAgent>) -> Self {
        Self { addr, agent }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        websocket::start_ws_server(&self.addr, self.agent.clone()).await
    }
}
