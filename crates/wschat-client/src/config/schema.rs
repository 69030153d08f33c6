use std::time::Duration;

use serde::Deserialize;
use wschat_core::error::{ChatError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    pub session: SessionSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.session.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// `http://` or `https://`; the socket scheme follows it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Bound on the login request and on the socket handshake.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            ws_path: default_ws_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ChatError::InvalidConfig(
                "server.base_url must start with http:// or https://".into(),
            ));
        }
        #[cfg(not(feature = "tls"))]
        if self.base_url.starts_with("https://") {
            return Err(ChatError::InvalidConfig(
                "server.base_url is https:// but this build has no `tls` feature".into(),
            ));
        }
        for (name, path) in [("login_path", &self.login_path), ("ws_path", &self.ws_path)] {
            if !path.starts_with('/') {
                return Err(ChatError::InvalidConfig(format!(
                    "server.{name} must start with '/'"
                )));
            }
        }
        if !(1000..=60000).contains(&self.request_timeout_ms) {
            return Err(ChatError::InvalidConfig(
                "server.request_timeout_ms must be between 1000 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_login_path() -> String {
    "/login".into()
}
fn default_ws_path() -> String {
    "/ws".into()
}
fn default_request_timeout_ms() -> u64 {
    10000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    pub username: String,

    /// Sender identity on outgoing messages; the username when unset.
    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default = "default_room")]
    pub default_room: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl SessionSection {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "session.username must not be empty".into(),
            ));
        }
        if self.default_room.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "session.default_room must not be empty".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(ChatError::InvalidConfig(
                "session.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(ChatError::InvalidConfig(
                "session.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(ChatError::InvalidConfig(
                "session.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(64..=1_048_576).contains(&self.max_frame_bytes) {
            return Err(ChatError::InvalidConfig(
                "session.max_frame_bytes must be between 64 and 1048576".into(),
            ));
        }
        Ok(())
    }

    pub fn sender_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

fn default_room() -> String {
    "general".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_max_frame_bytes() -> usize {
    4096
}
