//! Terminal-side view: the scrolling message log and the connection banner.
//!
//! The view keeps its own state so handlers can be tested without a terminal;
//! a terminal view additionally echoes every change to stdout.

use std::sync::{Mutex, MutexGuard};

use crate::session::ConnectionStatus;

/// Scrolling message log with a fixed-height viewport.
#[derive(Debug)]
pub struct MessageLog {
    lines: Vec<String>,
    viewport_rows: usize,
    scroll_top: usize,
}

impl MessageLog {
    pub fn new(viewport_rows: usize) -> Self {
        Self {
            lines: Vec::new(),
            viewport_rows: viewport_rows.max(1),
            scroll_top: 0,
        }
    }

    /// Append a line and scroll to the end.
    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
        self.scroll_to_end();
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll_top = self.max_scroll_top();
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_top = self.scroll_top.saturating_sub(rows);
    }

    pub fn max_scroll_top(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport_rows)
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn is_scrolled_to_bottom(&self) -> bool {
        self.scroll_top == self.max_scroll_top()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines currently inside the viewport.
    pub fn visible(&self) -> &[String] {
        let end = (self.scroll_top + self.viewport_rows).min(self.lines.len());
        self.lines.get(self.scroll_top..end).unwrap_or(&[])
    }
}

/// Banner text for a connection status.
pub fn banner_text(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Unconnected => "Not connected",
        ConnectionStatus::Connecting => "Connecting...",
        ConnectionStatus::Open => "Websocket Connected!",
        ConnectionStatus::Closed => "Websocket Disconnected!",
    }
}

/// Shared view state written by handlers and the session.
#[derive(Debug)]
pub struct ChatView {
    log: Mutex<MessageLog>,
    banner: Mutex<&'static str>,
    echo: bool,
}

impl ChatView {
    /// In-memory view (no terminal output).
    pub fn new(viewport_rows: usize) -> Self {
        Self {
            log: Mutex::new(MessageLog::new(viewport_rows)),
            banner: Mutex::new(banner_text(ConnectionStatus::Unconnected)),
            echo: false,
        }
    }

    /// View that also prints to stdout.
    pub fn terminal(viewport_rows: usize) -> Self {
        Self {
            echo: true,
            ..Self::new(viewport_rows)
        }
    }

    pub fn append_message(&self, line: String) {
        if self.echo {
            println!("{line}");
        }
        self.log().append(line);
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        let text = banner_text(status);
        *self.banner.lock().unwrap_or_else(|e| e.into_inner()) = text;
        if self.echo {
            println!("== {text} ==");
        }
    }

    /// One-off notice for the user; not part of the message log.
    pub fn notice(&self, text: &str) {
        if self.echo {
            println!("-- {text}");
        }
    }

    pub fn banner(&self) -> &'static str {
        *self.banner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn lines(&self) -> Vec<String> {
        self.log().lines().to_vec()
    }

    pub fn is_scrolled_to_bottom(&self) -> bool {
        self.log().is_scrolled_to_bottom()
    }

    fn log(&self) -> MutexGuard<'_, MessageLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}
