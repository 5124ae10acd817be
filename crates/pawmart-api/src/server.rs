use std::net::SocketAddr;
use std::{sync::Arc, time::Duration};

use pawmart_store::Store;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    cleanup::CleanupService,
    config::{Config, LogFormat},
    middleware::GateState,
    rate_limiter::RateLimiter,
    routes::create_router,
};

const APP_NAME: &str = "pawmart-api";

pub fn init_tracing(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into());

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .init();
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting pawmart-api server with config: {:?}", config);

    let rate_limiter = Arc::new(RateLimiter::new(config.contact_limit.clone()));
    info!("Contact gate initialized successfully");

    let store = Arc::new(Store::connect(&config.mongodb_uri, &config.database, APP_NAME).await?);

    let gate = GateState {
        limiter: Arc::clone(&rate_limiter),
        trust_proxy: config.trust_proxy,
    };

    let app = create_router(&config, gate, Arc::clone(&store)).layer(
        TraceLayer::new_for_http().on_response(
            |response: &axum::response::Response, latency: Duration, _span: &tracing::Span| {
                tracing::info!(
                    "response latency: {:?}, status: {}",
                    latency,
                    response.status()
                );
            },
        ),
    );

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    let server_url = config.server_url();
    info!("Server running on {}", server_url);
    info!("OpenAPI docs available at {}/openapi.json", server_url);

    // Print available environment variables for configuration
    info!("Configuration options:");
    info!("  PAWMART_HOST: Host to bind to (default: 0.0.0.0)");
    info!("  PORT or PAWMART_PORT: Port to bind to (default: 3000)");
    info!("  RUST_LOG or PAWMART_LOG_LEVEL: Log level (default: pawmart_api=debug,tower_http=debug)");
    info!("  PAWMART_LOG_FORMAT: Log format - 'json' or 'text' (default: json)");
    info!("  PAWMART_CORS_ORIGINS: Comma-separated CORS origins (default: *)");
    info!("  PAWMART_MONGODB_URI: Document store URI (default: mongodb://localhost:27017)");
    info!("  PAWMART_DATABASE: Database name (default: PawMart)");
    info!("  PAWMART_TRUST_PROXY: Honour forwarded-for headers (default: true)");
    info!("  PAWMART_CONTACT_WINDOW_SECONDS: Contact gate window (default: 600)");
    info!("  PAWMART_CONTACT_MAX_REQUESTS: Accepted contacts per window (default: 1)");
    info!("  PAWMART_CONTACT_CLEANUP_INTERVAL_SECONDS: Gate cleanup interval (default: 600)");

    let mut cleanup_service = CleanupService::new(
        Arc::clone(&rate_limiter),
        config.contact_limit.cleanup_interval_seconds as u64,
    );
    cleanup_service.start();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cleanup_service.stop();
    store.shutdown().await;
    info!("Shutting down pawmart-api server");

    Ok(())
}
