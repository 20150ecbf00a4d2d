use statview::api::views::AppState;
use statview::config::Config;
use statview::server;
use statview::storage::cache::DatasetCache;
use statview::storage::loader::FsDataSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[tokio::main]
async fn main() {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "statview=info,tower_http=info".into());
    if std::env::var("STATVIEW_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    tracing::info!(
        host = %config.host,
        port = config.port,
        data_dir = %config.data_dir.display(),
        cache_ttl_secs = config.cache_ttl_secs,
        "Starting statview"
    );

    if !config.data_dir.is_dir() {
        tracing::warn!(
            data_dir = %config.data_dir.display(),
            "Data directory does not exist; every load will fail until it is created"
        );
    }

    let cache = DatasetCache::new(config.cache_ttl_secs);
    let source = FsDataSource::new(&config.data_dir, cache.clone());
    let state = Arc::new(AppState::new(source));

    // Seed the selection so the dashboard opens on a report
    {
        let state = Arc::clone(&state);
        let fragment = config.initial_fragment.clone();
        let restored = tokio::task::spawn_blocking(move || {
            let mut viewer = state.viewer.lock();
            let restored = viewer.restore(&fragment);
            state.publish(&viewer);
            restored.map(|_| viewer.fragment().to_string())
        })
        .await;
        match restored {
            Ok(Ok(fragment)) => tracing::info!(fragment = %fragment, "Initial selection restored"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Initial selection failed"),
            Err(e) => tracing::error!(error = %e, "Initial selection task failed"),
        }
    }

    // Drop expired datasets periodically
    if config.cache_ttl_secs > 0 {
        let cleanup_every = Duration::from_secs(config.cache_ttl_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleanup_every);
            loop {
                interval.tick().await;
                cache.cleanup_expired();
                tracing::debug!(entries = cache.len(), "Dataset cache cleanup");
            }
        });
    }

    let app = server::build_router(state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(addr = %addr, "Listening");
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let draining = Arc::new(Notify::new());
    let serving = axum::serve(listener, app).with_graceful_shutdown({
        let draining = Arc::clone(&draining);
        async move {
            shutdown_signal().await;
            draining.notify_one();
        }
    });

    // In-flight requests get `shutdown_timeout` to finish once the signal arrives
    tokio::select! {
        result = async { serving.await } => match result {
            Ok(()) => tracing::info!("Server stopped"),
            Err(e) => tracing::error!(error = %e, "Server error"),
        },
        () = async {
            draining.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => tracing::warn!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Graceful shutdown timed out"
        ),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
