//! Greeter server.
//!
//! # Usage
//!
//! ```bash
//! ENDPOINT_PREFIX=/api GREETER_ADDR=127.0.0.1:3000 cargo run -p greeter
//!
//! curl -s localhost:3000/api/greet -d '{"name":"Ada"}'
//! ```

use endpoint_kit_web::DispatchConfig;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,greeter=debug,endpoint_kit_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = DispatchConfig::from_env();
    tracing::info!(
        prefix = %config.prefix,
        body_limit = config.body_limit,
        "Configuration loaded"
    );

    let service = greeter::build_service(config)?;
    tracing::info!(endpoints = service.len(), "Service ready");

    let app = service.router().layer(TraceLayer::new_for_http());

    let addr: SocketAddr = std::env::var("GREETER_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "Unable to listen for shutdown signal");
            }
            tracing::info!("Shutting down gracefully...");
        })
        .await?;

    Ok(())
}
