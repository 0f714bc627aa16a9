//! Bot protocol server.
//!
//! Serves a [`PoeBot`] on `POST /`. Requests must carry
//! `Authorization: Bearer <access key>`; queries are answered with an SSE
//! body that starts with `meta` and ends with `done`.

mod handler;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::post, Router};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::config::BotConfig;
use crate::error::{PoeError, PoeResult};
use crate::traits::PoeBot;

pub use handler::{query_frames, BotState};

/// Build the router for `bot`.
///
/// Fails if `access_key` is empty: the endpoint never runs unprotected.
pub fn router(bot: Arc<dyn PoeBot>, access_key: &str) -> PoeResult<Router> {
    if access_key.is_empty() {
        return Err(PoeError::config("Access Key is required"));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = BotState {
        bot,
        access_key: Arc::from(access_key),
    };

    Ok(Router::new()
        .route("/", post(handler::bot_handler).get(handler::root_handler))
        .layer(cors)
        .with_state(state))
}

/// Start the server on a specific address.
///
/// Binding to port 0 picks a free port; the bound address is returned
/// with the server task.
pub async fn start_server_on(
    addr: SocketAddr,
    bot: Arc<dyn PoeBot>,
    access_key: &str,
) -> PoeResult<(JoinHandle<()>, SocketAddr)> {
    let app = router(bot, access_key)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Bot server listening on http://{}", actual_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Bot server error: {}", e);
        }
    });

    Ok((handle, actual_addr))
}

/// Serve `bot` with the address and key from `config` until ctrl-c.
pub async fn serve(config: &BotConfig, bot: Arc<dyn PoeBot>) -> PoeResult<()> {
    let access_key = config.require_access_key()?;
    let app = router(bot, access_key)?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        bot = %config.bot_name,
        "Bot server listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down bot server");
        })
        .await?;
    Ok(())
}
