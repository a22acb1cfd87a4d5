//! HTTP delivery layer: router assembly, shared state, graceful shutdown.

pub mod error;

mod channels;
mod download;
mod info;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::media::MediaExtractor;
use crate::store::ChannelStore;
use crate::youtube::YouTubeApi;

/// State shared across all HTTP handlers.
pub struct AppState {
    pub config: Config,
    pub extractor: MediaExtractor,
    pub store: ChannelStore,
    pub youtube: Option<YouTubeApi>,
}

pub async fn run(config: Config) -> Result<()> {
    let store = ChannelStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database: {}", config.database_url))?;

    let extractor = MediaExtractor::new().context("Failed to initialize media extractor")?;
    if let Err(e) = extractor.test_setup().await {
        warn!("Media extractor test failed: {}", e);
    }

    let youtube = match config.get_youtube_api_key() {
        Some(key) => Some(YouTubeApi::new(key)?),
        None => {
            info!("No YouTube API key configured; channel video listing is disabled");
            None
        }
    };

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind_address))?;

    let state = Arc::new(AppState {
        config,
        extractor,
        store,
        youtube,
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("vidhub stopped");
    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(info::root))
        .route("/download", get(download::download))
        .route("/video_info", get(info::video_info))
        .route("/channels", get(channels::list_channels))
        .route("/channels/{channel_id}/videos", get(channels::channel_videos))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if let Some(origins_str) = &config.cors_allowed_origins {
        let origins: Vec<axum::http::HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        if !origins.is_empty() {
            return CorsLayer::new()
                .allow_origin(origins)
                .allow_headers(Any)
                .allow_methods(Any);
        }
    }

    // Wildcard is the development default; set cors_allowed_origins in
    // production.
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
