//! medtour-i18n: translation caching for the medical-tourism site.
//! Server side: a TTL cache in front of the translation provider, served over
//! HTTP. Client side: a per-session cache manager that deduplicates
//! in-flight requests, batches under a concurrency limit, and persists a
//! bounded snapshot between sessions.

pub mod client;
pub mod clock;
pub mod config;
pub mod languages;
pub mod metrics;
pub mod scheduler;
pub mod server;
pub mod translate;

use std::sync::Arc;

use tracing::info;

use config::ServerConfig;
use metrics::MetricsRegistry;
use translate::{HttpTranslator, ServerCache};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("medtour_i18n=debug,info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Wire the provider, cache and router together and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let translator = HttpTranslator::new(&config.provider_url, config.provider_timeout())?;
    let metrics = Arc::new(MetricsRegistry::new());
    let cache = Arc::new(
        ServerCache::new(Arc::new(translator), config.cache()).with_metrics(metrics),
    );
    let app = server::router(server::AppState::new(cache));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        addr = %listener.local_addr()?,
        provider = %config.provider_url,
        "translate endpoint listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("translate endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed, shutting down");
    }
}
