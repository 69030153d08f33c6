//! Socket URL construction.

use wschat_core::error::{ChatError, Result};

use crate::auth::Otp;

/// Build the socket URL from an HTTP base URL.
///
/// The scheme follows the base URL's transport security:
/// `https://` becomes `wss://`, `http://` becomes `ws://`.
pub fn ws_url(base_url: &str, ws_path: &str, otp: &Otp) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(ChatError::InvalidConfig(format!(
            "base url must be http:// or https://: {base_url}"
        )));
    };

    Ok(format!("{ws_base}{ws_path}?otp={}", otp.as_str()))
}
