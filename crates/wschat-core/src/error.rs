//! Shared error type across wschat crates.

use thiserror::Error;

use crate::protocol::DecodeError;

/// Stable error codes, usable in logs and by front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Frame could not be decoded into a known event.
    BadFrame,
    /// Login endpoint rejected the credentials.
    Unauthorized,
    /// Login request failed for a reason other than rejection.
    LoginFailed,
    /// Operation requires an open connection.
    NotConnected,
    /// A connection is already live or being established.
    AlreadyConnected,
    /// WebSocket transport failure.
    Transport,
    /// Invalid configuration.
    InvalidConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadFrame => "BAD_FRAME",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::LoginFailed => "LOGIN_FAILED",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::AlreadyConnected => "ALREADY_CONNECTED",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("bad frame: {0}")]
    Decode(#[from] DecodeError),
    #[error("unauthorized")]
    Unauthorized,
    #[error("login failed: {0}")]
    Login(String),
    #[error("not connected")]
    NotConnected,
    #[error("already connected")]
    AlreadyConnected,
    #[error("transport: {0}")]
    Transport(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ChatError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::Decode(_) => ErrorCode::BadFrame,
            ChatError::Unauthorized => ErrorCode::Unauthorized,
            ChatError::Login(_) => ErrorCode::LoginFailed,
            ChatError::NotConnected => ErrorCode::NotConnected,
            ChatError::AlreadyConnected => ErrorCode::AlreadyConnected,
            ChatError::Transport(_) => ErrorCode::Transport,
            ChatError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            ChatError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            ChatError::Internal(_) => ErrorCode::Internal,
        }
    }
}
