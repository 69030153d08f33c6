//! WebSocket connection loop.
//!
//! Responsibilities:
//! - Write queued outbound frames (single writer, no lock around the socket)
//! - Decode inbound text frames once and hand them to the dispatcher
//! - Lifecycle: periodic ping + idle timeout
//!
//! The loop returns when the connection is over; the caller owns the status
//! transition to `Closed`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};

use crate::dispatch::Dispatcher;
use crate::transport::codec::{self, Inbound};

const CLOSE_DRAIN: Duration = Duration::from_secs(1);

/// Per-connection limits and timers.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionParams {
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
    pub max_frame_bytes: usize,
}

/// Why the connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Close requested locally (explicit close or all senders dropped).
    ClientClosed,
    /// Peer sent a close frame.
    PeerClosed,
    /// Stream ended without a close frame.
    StreamEnded,
    ReadError,
    WriteError,
    IdleTimeout,
}

pub async fn run_connection<S>(
    stream: WebSocketStream<S>,
    mut out_rx: mpsc::Receiver<Message>,
    dispatcher: Arc<Dispatcher>,
    params: ConnectionParams,
    errors: Arc<AtomicU64>,
) -> CloseReason
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut ws_tx, mut ws_rx) = stream.split();

    let mut ping_tick =
        tokio::time::interval_at(Instant::now() + params.ping_interval, params.ping_interval);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(msg) = maybe_out else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    drain_until_closed(&mut ws_rx).await;
                    return CloseReason::ClientClosed;
                };
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = ws_tx.send(msg).await {
                    errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "websocket write failed");
                    return CloseReason::WriteError;
                }
                if closing {
                    drain_until_closed(&mut ws_rx).await;
                    return CloseReason::ClientClosed;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { return CloseReason::StreamEnded; };
                let msg = match incoming {
                    Ok(msg) => msg,
                    Err(e) => {
                        errors.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "websocket read failed");
                        return CloseReason::ReadError;
                    }
                };

                last_activity = Instant::now();

                match codec::decode(msg, params.max_frame_bytes) {
                    Inbound::Event { decoded, bytes_len } => {
                        match dispatcher.dispatch(decoded).await {
                            Ok(route) => tracing::trace!(?route, bytes_len, "frame routed"),
                            Err(e) => tracing::warn!(
                                error = %e,
                                code = e.code().as_str(),
                                "event handler failed"
                            ),
                        }
                    }
                    Inbound::Binary { bytes_len } => {
                        tracing::debug!(bytes_len, "binary frame ignored");
                    }
                    // tungstenite queues the pong reply itself
                    Inbound::Ping | Inbound::Pong | Inbound::Ignored => {}
                    Inbound::Close => {
                        // push out the close reply tungstenite queued
                        let _ = ws_tx.flush().await;
                        return CloseReason::PeerClosed;
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                if let Err(e) = ws_tx.send(Message::Ping(Bytes::new())).await {
                    errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "websocket ping failed");
                    return CloseReason::WriteError;
                }
            }

            // idle timeout
            _ = tokio::time::sleep_until(last_activity + params.idle_timeout) => {
                tracing::warn!(idle_ms = params.idle_timeout.as_millis() as u64, "websocket idle timeout");
                let _ = ws_tx.send(Message::Close(None)).await;
                return CloseReason::IdleTimeout;
            }
        }
    }
}

/// Read until the peer acknowledges our close frame, bounded by `CLOSE_DRAIN`.
async fn drain_until_closed<St>(ws_rx: &mut St)
where
    St: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let _ = tokio::time::timeout(CLOSE_DRAIN, async {
        while let Some(Ok(msg)) = ws_rx.next().await {
            if msg.is_close() {
                break;
            }
        }
    })
    .await;
}
