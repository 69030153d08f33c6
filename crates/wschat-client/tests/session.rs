//! End-to-end session tests against the in-process server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use wschat_client::auth::Otp;
use wschat_client::controller::Controller;
use wschat_client::dispatch::{Dispatcher, FallbackHandler, NewMessageHandler, Unroutable};
use wschat_client::session::{ChatSession, ConnectionStatus};
use wschat_client::transport::CloseReason;
use wschat_client::view::ChatView;

use test_server::{wait_until, wait_until_for, TestServer};

fn controller(server: &TestServer) -> Controller {
    Controller::new(&server.config(), Arc::new(ChatView::new(10))).unwrap()
}

async fn wait_for_status(session: &ChatSession, want: ConnectionStatus) {
    wait_for_status_within(session, want, Duration::from_secs(5)).await;
}

async fn wait_for_status_within(session: &ChatSession, want: ConnectionStatus, limit: Duration) {
    let mut rx = session.subscribe_status();
    tokio::time::timeout(limit, rx.wait_for(|s| *s == want))
        .await
        .expect("status not reached in time")
        .unwrap();
}

#[tokio::test]
async fn invalid_login_never_connects() {
    let server = TestServer::spawn().await;
    let c = controller(&server);

    assert!(!c.run_login("wrong").await);

    assert_eq!(server.state.login_count(), 1);
    assert!(server.state.otps_seen().is_empty());
    assert_eq!(c.session().status(), ConnectionStatus::Unconnected);
}

#[tokio::test]
async fn valid_login_connects_with_otp() {
    let server = TestServer::spawn().await;
    let c = controller(&server);

    assert!(c.run_login("secret").await);

    assert_eq!(server.state.otps_seen(), vec!["XYZ".to_string()]);
    assert_eq!(c.session().status(), ConnectionStatus::Open);
    assert_eq!(c.view().banner(), "Websocket Connected!");

    c.session().close().await;
}

#[tokio::test]
async fn sent_message_comes_back_rendered() {
    let server = TestServer::spawn().await;
    let c = controller(&server);
    assert!(c.run_login("secret").await);

    c.session().send_message("hello").await.unwrap();

    let view = Arc::clone(c.view());
    wait_until(|| !view.lines().is_empty()).await;
    let line = &view.lines()[0];
    assert!(line.contains("2023-11-14 22:13:20"), "{line}");
    assert!(line.contains("alice: hello"), "{line}");
    assert!(view.is_scrolled_to_bottom());

    c.session().close().await;
}

#[tokio::test]
async fn send_while_unconnected_is_an_error() {
    let server = TestServer::spawn().await;
    let c = controller(&server);

    let err = c.session().send_message("hello").await.unwrap_err();
    assert_eq!(err.code().as_str(), "NOT_CONNECTED");
}

#[tokio::test]
async fn second_connect_is_rejected() {
    let server = TestServer::spawn().await;
    let c = controller(&server);
    assert!(c.run_login("secret").await);

    let err = c.session().connect(&Otp::new("XYZ").unwrap()).await.unwrap_err();
    assert_eq!(err.code().as_str(), "ALREADY_CONNECTED");
    assert_eq!(server.state.otps_seen().len(), 1);
    assert_eq!(c.session().status(), ConnectionStatus::Open);

    c.session().close().await;
}

#[tokio::test]
async fn rejected_otp_leaves_session_closed() {
    let server = TestServer::spawn().await;
    let c = controller(&server);

    let err = c.session().connect(&Otp::new("stale").unwrap()).await.unwrap_err();
    assert_eq!(err.code().as_str(), "TRANSPORT");
    assert_eq!(c.session().status(), ConnectionStatus::Closed);

    // no reconnect from Closed
    let err = c.session().connect(&Otp::new("XYZ").unwrap()).await.unwrap_err();
    assert_eq!(err.code().as_str(), "ALREADY_CONNECTED");
}

#[tokio::test]
async fn peer_close_moves_to_closed() {
    let server = TestServer::spawn().await;
    let c = controller(&server);
    assert!(c.run_login("secret").await);

    c.session().send_message("bye").await.unwrap();
    wait_for_status(c.session(), ConnectionStatus::Closed).await;

    assert_eq!(c.view().banner(), "Websocket Disconnected!");
    let err = c.session().send_message("anyone?").await.unwrap_err();
    assert_eq!(err.code().as_str(), "NOT_CONNECTED");

    // our close reply reaches the server before the socket drops
    let state = server.state.clone();
    wait_until(|| state.close_reply_count() == 1).await;
    assert_eq!(c.session().close().await, Some(CloseReason::PeerClosed));
}

#[tokio::test]
async fn explicit_close_moves_to_closed() {
    let server = TestServer::spawn().await;
    let c = controller(&server);
    assert!(c.run_login("secret").await);

    c.session().close().await;

    assert_eq!(c.session().status(), ConnectionStatus::Closed);
    assert_eq!(c.view().banner(), "Websocket Disconnected!");
}

struct CountingFallback {
    hits: Arc<AtomicUsize>,
}

#[async_trait]
impl FallbackHandler for CountingFallback {
    async fn handle(&self, reason: Unroutable) {
        assert!(matches!(reason, Unroutable::Undecodable(_)), "{reason:?}");
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn unknown_event_goes_to_fallback_and_session_survives() {
    let server = TestServer::spawn().await;
    let cfg = server.config();
    let view = Arc::new(ChatView::new(10));
    let hits = Arc::new(AtomicUsize::new(0));
    let c = controller_with_fallback(&cfg, &view, &hits);
    assert!(c.run_login("secret").await);

    c.session().send_message("poke").await.unwrap();

    wait_until(|| !view.lines().is_empty()).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(view.lines()[0].contains("alice: poke"));
    assert_eq!(c.session().status(), ConnectionStatus::Open);

    c.session().close().await;
}

#[tokio::test]
async fn run_reads_commands_until_quit() {
    let server = TestServer::spawn().await;
    let c = controller(&server);
    assert!(c.run_login("secret").await);

    let input: &[u8] = b"hello\n/room random\n/quit\nignored\n";
    c.run(input).await.unwrap();

    assert_eq!(c.session().selected_room(), "random");
    assert_eq!(c.session().status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn run_returns_when_closed_before_input() {
    let server = TestServer::spawn().await;
    let c = controller(&server);
    assert!(c.run_login("secret").await);

    c.session().send_message("bye").await.unwrap();
    wait_for_status(c.session(), ConnectionStatus::Closed).await;

    // input stays open and never yields a line
    let (_keep_open, input) = tokio::io::duplex(64);
    let input = tokio::io::BufReader::new(input);
    tokio::time::timeout(Duration::from_secs(2), c.run(input))
        .await
        .expect("run kept waiting after the socket closed")
        .unwrap();
}

fn controller_with_fallback(
    cfg: &wschat_client::config::ClientConfig,
    view: &Arc<ChatView>,
    hits: &Arc<AtomicUsize>,
) -> Controller {
    let dispatcher = Dispatcher::builder()
        .register(Arc::new(NewMessageHandler::new(Arc::clone(view))))
        .fallback(Arc::new(CountingFallback { hits: Arc::clone(hits) }))
        .build();
    let session = ChatSession::new(cfg, dispatcher, Arc::clone(view));
    Controller::from_parts(cfg, session, Arc::clone(view)).unwrap()
}

#[tokio::test]
async fn binary_frame_is_ignored() {
    let server = TestServer::spawn().await;
    let cfg = server.config();
    let view = Arc::new(ChatView::new(10));
    let hits = Arc::new(AtomicUsize::new(0));
    let c = controller_with_fallback(&cfg, &view, &hits);
    assert!(c.run_login("secret").await);

    c.session().send_message("blob").await.unwrap();

    wait_until(|| !view.lines().is_empty()).await;
    assert!(view.lines()[0].contains("alice: blob"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(c.session().status(), ConnectionStatus::Open);

    c.session().close().await;
}

#[tokio::test]
async fn client_pings_the_server() {
    let server = TestServer::spawn().await;
    let c = Controller::new(&server.fast_keepalive_config("/ws"), Arc::new(ChatView::new(10))).unwrap();
    assert!(c.run_login("secret").await);

    let state = server.state.clone();
    wait_until_for(Duration::from_secs(8), || state.ping_count() >= 1).await;
    assert_eq!(c.session().status(), ConnectionStatus::Open);

    c.session().close().await;
}

#[tokio::test]
async fn silent_server_hits_idle_timeout() {
    let server = TestServer::spawn().await;
    let c = Controller::new(&server.fast_keepalive_config("/silent"), Arc::new(ChatView::new(10))).unwrap();
    assert!(c.run_login("secret").await);
    assert_eq!(c.session().status(), ConnectionStatus::Open);

    wait_for_status_within(c.session(), ConnectionStatus::Closed, Duration::from_secs(15)).await;

    assert_eq!(c.session().close().await, Some(CloseReason::IdleTimeout));
    assert_eq!(c.view().banner(), "Websocket Disconnected!");
}
