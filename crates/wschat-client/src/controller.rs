//! Terminal controller: wires user input to the session.
//!
//! Input lines map to three actions, one per form in a browser chat page:
//! plain text sends a message, `/room <name>` changes the chatroom, and
//! `/quit` ends the session. Login runs once before input is read.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use wschat_core::error::{ChatError, Result};

use crate::auth::{Credentials, LoginClient};
use crate::config::ClientConfig;
use crate::dispatch::{Dispatcher, NewMessageHandler};
use crate::session::{ChatSession, ConnectionStatus};
use crate::view::ChatView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    ChangeRoom(String),
    Quit,
    /// Blank line or a malformed command.
    Nothing,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Nothing;
        }
        if line == "/quit" {
            return Command::Quit;
        }
        if let Some(rest) = line.strip_prefix("/room") {
            let room = rest.trim();
            if rest.starts_with(char::is_whitespace) && !room.is_empty() {
                return Command::ChangeRoom(room.to_string());
            }
            return Command::Nothing;
        }
        Command::Send(line.to_string())
    }
}

/// Built-in dispatcher: `"new message"` renders into `view`, everything else is logged.
pub fn default_dispatcher(view: Arc<ChatView>) -> Dispatcher {
    Dispatcher::builder()
        .register(Arc::new(NewMessageHandler::new(view)))
        .build()
}

pub struct Controller {
    login: LoginClient,
    username: String,
    session: ChatSession,
    view: Arc<ChatView>,
}

impl Controller {
    pub fn new(cfg: &ClientConfig, view: Arc<ChatView>) -> Result<Self> {
        let session = ChatSession::new(cfg, default_dispatcher(Arc::clone(&view)), Arc::clone(&view));
        Self::from_parts(cfg, session, view)
    }

    /// Controller over a session built by the caller (custom dispatcher).
    pub fn from_parts(cfg: &ClientConfig, session: ChatSession, view: Arc<ChatView>) -> Result<Self> {
        Ok(Self {
            login: LoginClient::new(&cfg.server)?,
            username: cfg.session.username.clone(),
            session,
            view,
        })
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn view(&self) -> &Arc<ChatView> {
        &self.view
    }

    /// Log in and open the socket. Failures are logged and reported as `false`;
    /// a failed login never attempts a connection.
    pub async fn run_login(&self, password: &str) -> bool {
        let creds = Credentials::new(self.username.clone(), password);
        let otp = match self.login.login(&creds).await {
            Ok(otp) => otp,
            Err(e) => {
                tracing::error!(error = %e, code = e.code().as_str(), url = %self.login.url(), "login failed");
                self.view.notice(&format!("login failed: {e}"));
                return false;
            }
        };

        match self.session.connect(&otp).await {
            Ok(()) => true,
            Err(e) => {
                self.view.notice(&format!("connection failed: {e}"));
                false
            }
        }
    }

    pub async fn handle(&self, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Send(text) => {
                if let Err(e) = self.session.send_message(&text).await {
                    tracing::warn!(error = %e, code = e.code().as_str(), "message not sent");
                    self.view.notice(&format!("message not sent: {e}"));
                }
            }
            Command::ChangeRoom(room) => {
                if self.session.change_chatroom(&room) {
                    self.view.notice(&format!("selected chatroom: {room}"));
                }
            }
            Command::Quit => return ControlFlow::Break(()),
            Command::Nothing => {}
        }
        ControlFlow::Continue(())
    }

    /// Read commands until `/quit`, end of input, or the connection closes.
    pub async fn run<R>(&self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut status = self.session.subscribe_status();

        // the socket may have closed before input was read
        if *status.borrow_and_update() != ConnectionStatus::Closed {
            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        let line = line.map_err(|e| ChatError::Internal(format!("read input failed: {e}")))?;
                        let Some(line) = line else { break; };
                        if self.handle(Command::parse(&line)).await.is_break() {
                            break;
                        }
                    }
                    changed = status.changed() => {
                        if changed.is_err() || *status.borrow() == ConnectionStatus::Closed {
                            break;
                        }
                    }
                }
            }
        }

        self.session.close().await;
        Ok(())
    }
}
