//! wschat terminal client.
//!
//! - Config: `wschat.yaml`, or the path in `WSCHAT_CONFIG`
//! - Password: `WSCHAT_PASSWORD`
//! - Chat lines on stdout, logs on stderr (`RUST_LOG` filter)

use std::sync::Arc;

use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use wschat_client::{config, controller::Controller, view::ChatView};
use wschat_core::error::{ChatError, Result};

const VIEWPORT_ROWS: usize = 40;

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::var("WSCHAT_CONFIG").unwrap_or_else(|_| "wschat.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let password = std::env::var("WSCHAT_PASSWORD")
        .map_err(|_| ChatError::InvalidConfig("WSCHAT_PASSWORD must be set".into()))?;

    let view = Arc::new(ChatView::terminal(VIEWPORT_ROWS));
    let controller = Controller::new(&cfg, view)?;

    tracing::info!(server = %cfg.server.base_url, user = %cfg.session.username, "wschat starting");
    if !controller.run_login(&password).await {
        return Ok(());
    }

    controller.run(BufReader::new(tokio::io::stdin())).await
}
