use crate::agent::ChatAgent;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::render::render_message;
use crate::session::{ discard_pending, ChatSession, SessionEvent };

use chrono::Utc;
use futures::{ Sink, SinkExt, StreamExt };
use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use log::{ debug, info, warn, error };
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::net::TcpListener;
use tokio::sync::mpsc::{ self, UnboundedReceiver };
use tokio_tungstenite::{ accept_async, WebSocketStream };
use tokio_tungstenite::tungstenite::protocol::Message;

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::new(10).unwrap()));
}

pub async fn start_ws_server(
    addr: &str,
    agent: Arc<ChatAgent>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS server listening on: {}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let agent = Arc::clone(&agent);
        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(ws) => handle_connection(peer, ws, agent).await,
                Err(e) => error!("Handshake failed for {}: {}", peer, e),
            }
        });
    }
}

/// Frame sent to the browser for one session event.
pub fn server_message_for(event: SessionEvent) -> ServerMessage {
    match event {
        SessionEvent::MessageUpdated(message) => {
            let html = render_message(&message);
            ServerMessage::Message { message, html }
        }
        SessionEvent::MessageCompleted { id } =>
            ServerMessage::Done {
                message_id: id,
                timestamp: Utc::now().timestamp(),
            },
    }
}

/// Clears the session and drops its queued events, so the `cleared` frame is
/// not followed by updates for the messages it removed.
pub async fn clear_session(
    session: &ChatSession,
    events: &mut UnboundedReceiver<SessionEvent>
) -> ServerMessage {
    session.clear().await;
    let dropped = discard_pending(events);
    if dropped > 0 {
        debug!("Dropped {} queued updates after clear", dropped);
    }
    ServerMessage::Cleared
}

async fn send_json<T>(tx: &mut T, message: &ServerMessage) -> bool
    where T: Sink<Message> + Unpin
{
    match serde_json::to_string(message) {
        Ok(json) => tx.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            error!("Failed to encode server message: {}", e);
            true
        }
    }
}

/// Relays one browser connection to its own chat session. The session and all
/// of its timers are torn down when the socket closes.
pub async fn handle_connection<S>(peer: SocketAddr, websocket: WebSocketStream<S>, agent: Arc<ChatAgent>)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let (mut tx, mut rx) = websocket.split();
    let (session, mut events) = agent.open_session();
    let session = Arc::new(session);
    let (notice_tx, mut notices) = mpsc::unbounded_channel::<ServerMessage>();
    info!("Assigned conversation ID {} to {}", session.conversation_id().await, peer);

    loop {
        tokio::select! {
            incoming = rx.next() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        info!("WebSocket error for {}: {}", peer, e);
                        break;
                    }
                    None => break,
                };

                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let error_msg = ServerMessage::Error {
                        message: "Message too large".to_string(),
                    };
                    send_json(&mut tx, &error_msg).await;
                    break;
                }

                match message {
                    Message::Text(text) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Chat { content }) => {
                                let session = Arc::clone(&session);
                                let notice_tx = notice_tx.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = session.submit(&content).await {
                                        let _ = notice_tx.send(ServerMessage::Error {
                                            message: e.to_string(),
                                        });
                                    }
                                });
                                ServerMessage::Processing
                            }
                            Ok(ClientMessage::Clear) => clear_session(&session, &mut events).await,
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                ServerMessage::Error {
                                    message: format!("Failed to parse message: {}", e),
                                }
                            }
                        };
                        if !send_json(&mut tx, &reply).await {
                            error!("Error sending reply to {}", peer);
                            break;
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Frame(_) => {}
                }
            }
            Some(event) = events.recv() => {
                if !send_json(&mut tx, &server_message_for(event)).await {
                    error!("Error sending update to {}", peer);
                    break;
                }
            }
            Some(notice) = notices.recv() => {
                if !send_json(&mut tx, &notice).await {
                    break;
                }
            }
        }
    }

    session.shutdown().await;
    info!("WebSocket connection closed for {}", peer);
}
