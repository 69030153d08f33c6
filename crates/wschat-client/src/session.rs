//! Client session context.
//!
//! One `ChatSession` owns everything the chat needs between login and
//! teardown: the connection status, the outbound queue of the live socket,
//! the selected chatroom, the dispatcher, and the view it reports status to.
//!
//! Lifecycle: `Unconnected -> Connecting -> Open -> Closed`. A session
//! connects at most once; there is no reconnect.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use wschat_core::error::{ChatError, Result};
use wschat_core::protocol::{Event, SendMessageEvent};

use crate::auth::Otp;
use crate::config::{ClientConfig, ServerSection};
use crate::dispatch::Dispatcher;
use crate::transport::codec;
use crate::transport::ws::{run_connection, CloseReason, ConnectionParams};
use crate::transport::ws_url;
use crate::view::ChatView;

const OUTBOUND_QUEUE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Unconnected,
    Connecting,
    Open,
    Closed,
}

#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    server: ServerSection,
    params: ConnectionParams,
    sender_name: String,
    status: watch::Sender<ConnectionStatus>,
    outbound: Mutex<Option<mpsc::Sender<Message>>>,
    task: Mutex<Option<JoinHandle<CloseReason>>>,
    selected_room: StdMutex<String>,
    dispatcher: Arc<Dispatcher>,
    view: Arc<ChatView>,
    errors: Arc<AtomicU64>,
}

impl SessionInner {
    fn set_status(&self, status: ConnectionStatus) {
        let prev = self.status.send_replace(status);
        if prev != status {
            tracing::info!(from = ?prev, to = ?status, "connection status");
        }
        self.view.set_status(status);
    }
}

impl ChatSession {
    pub fn new(cfg: &ClientConfig, dispatcher: Dispatcher, view: Arc<ChatView>) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Unconnected);
        let session = &cfg.session;
        Self {
            inner: Arc::new(SessionInner {
                server: cfg.server.clone(),
                params: ConnectionParams {
                    ping_interval: session.ping_interval(),
                    idle_timeout: session.idle_timeout(),
                    max_frame_bytes: session.max_frame_bytes,
                },
                sender_name: session.sender_name().to_string(),
                status,
                outbound: Mutex::new(None),
                task: Mutex::new(None),
                selected_room: StdMutex::new(session.default_room.clone()),
                dispatcher: Arc::new(dispatcher),
                view,
                errors: Arc::new(AtomicU64::new(0)),
            }),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    pub fn sender_name(&self) -> &str {
        &self.inner.sender_name
    }

    pub fn selected_room(&self) -> String {
        self.inner
            .selected_room
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Socket errors observed so far. Errors alone do not change the status.
    pub fn error_count(&self) -> u64 {
        self.inner.errors.load(Ordering::Relaxed)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }

    /// Open the socket with a one-time pass.
    ///
    /// Only legal from `Unconnected`; any later or concurrent call returns
    /// `AlreadyConnected`. A failed attempt leaves the session `Closed`.
    pub async fn connect(&self, otp: &Otp) -> Result<()> {
        let claimed = self.inner.status.send_if_modified(|s| {
            if *s == ConnectionStatus::Unconnected {
                *s = ConnectionStatus::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(ChatError::AlreadyConnected);
        }
        self.inner.set_status(ConnectionStatus::Connecting);

        match self.open_socket(otp).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, code = e.code().as_str(), "websocket connect failed");
                self.inner.set_status(ConnectionStatus::Closed);
                Err(e)
            }
        }
    }

    async fn open_socket(&self, otp: &Otp) -> Result<()> {
        let server = &self.inner.server;
        let url = ws_url(&server.base_url, &server.ws_path, otp)?;
        tracing::debug!(base = %server.base_url, path = %server.ws_path, "websocket connecting");

        let (stream, _resp) =
            tokio::time::timeout(server.request_timeout(), tokio_tungstenite::connect_async(url))
                .await
                .map_err(|_| ChatError::Transport("websocket handshake timed out".into()))?
                .map_err(|e| ChatError::Transport(e.to_string()))?;

        let (out_tx, out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
        *self.inner.outbound.lock().await = Some(out_tx);
        self.inner.set_status(ConnectionStatus::Open);

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let reason = run_connection(
                stream,
                out_rx,
                Arc::clone(&inner.dispatcher),
                inner.params,
                Arc::clone(&inner.errors),
            )
            .await;
            inner.outbound.lock().await.take();
            inner.set_status(ConnectionStatus::Closed);
            tracing::info!(?reason, errors = inner.errors.load(Ordering::Relaxed), "websocket closed");
            reason
        });
        *self.inner.task.lock().await = Some(handle);

        Ok(())
    }

    /// Submit a chat message as this session's sender.
    pub async fn send_message(&self, draft: &str) -> Result<()> {
        let event = Event::from(SendMessageEvent::new(draft, self.sender_name()));
        self.send_event(&event).await
    }

    /// Queue an event on the live socket. Fails with `NotConnected` unless `Open`.
    pub async fn send_event(&self, event: &Event) -> Result<()> {
        if self.status() != ConnectionStatus::Open {
            return Err(ChatError::NotConnected);
        }
        let tx = self
            .inner
            .outbound
            .lock()
            .await
            .clone()
            .ok_or(ChatError::NotConnected)?;

        let msg = codec::encode(event)?;
        tx.send(msg).await.map_err(|_| ChatError::NotConnected)?;
        tracing::debug!(kind = %event.kind(), "event queued");
        Ok(())
    }

    /// Select another chatroom. Returns whether the selection changed.
    ///
    /// Only the local selection changes; nothing is sent to the server.
    pub fn change_chatroom(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let mut room = self
            .inner
            .selected_room
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *room == name {
            return false;
        }
        tracing::info!(from = %*room, to = %name, "chatroom changed");
        *room = name.to_string();
        true
    }

    /// Close the socket and wait for the connection task to finish.
    pub async fn close(&self) -> Option<CloseReason> {
        let tx = self.inner.outbound.lock().await.take();
        if let Some(tx) = tx {
            let _ = tx.send(Message::Close(None)).await;
        }
        let handle = self.inner.task.lock().await.take()?;
        handle.await.ok()
    }
}
