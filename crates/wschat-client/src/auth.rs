//! OTP login against the chat server's HTTP endpoint.
//!
//! `POST {base_url}{login_path}` with `{username, password}`; a 2xx response
//! carries `{otp}`, a one-time pass that authorizes exactly one socket upgrade.

use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use wschat_core::error::{ChatError, Result};

use crate::config::ServerSection;

/// Login request body.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    otp: String,
}

/// One-time pass issued by the login endpoint.
///
/// Restricted to URL-unreserved characters so it can be placed in the socket
/// query string verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct Otp(String);

impl Otp {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(ChatError::Login("empty otp".into()));
        }
        let url_safe = token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'));
        if !url_safe {
            return Err(ChatError::Login(
                "otp contains characters outside the URL-safe set".into(),
            ));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Otp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Otp(<redacted>)")
    }
}

/// HTTP client for the login endpoint.
pub struct LoginClient {
    url: String,
    client: Client,
}

impl LoginClient {
    pub fn new(server: &ServerSection) -> Result<Self> {
        let client = Client::builder()
            .timeout(server.request_timeout())
            .build()
            .map_err(|e| ChatError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self {
            url: format!("{}{}", server.base_url.trim_end_matches('/'), server.login_path),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Exchange credentials for an OTP.
    ///
    /// Any non-2xx status is `Unauthorized`; transport and body errors are `Login`.
    pub async fn login(&self, creds: &Credentials) -> Result<Otp> {
        let resp = self
            .client
            .post(&self.url)
            .json(creds)
            .send()
            .await
            .map_err(|e| ChatError::Login(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, username = %creds.username, "login rejected");
            return Err(ChatError::Unauthorized);
        }

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| ChatError::Login(format!("invalid login response: {e}")))?;

        tracing::debug!(username = %creds.username, "login accepted");
        Otp::new(body.otp)
    }
}
