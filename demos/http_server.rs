//! Demo HTTP server with one admission-controlled route and one open route.
//!
//! Run with:
//!
//! ```text
//! cargo run --example http_server --features axum -- \
//!     --strategy sliding_window_counter --limit 10 --window-ms 60000
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use tokio::signal;
use tracing::{info, Level};

use turnstile::middleware::enforce_admission;
use turnstile::{Limiter, LimiterConfig, StrategyKind};

#[derive(Parser)]
#[command(about = "Demo server for the turnstile admission engine")]
struct Args {
    /// Window strategy to run
    #[arg(long, default_value = "fixed_window")]
    strategy: StrategyKind,

    /// Requests allowed per identifier within one window
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Window size in milliseconds
    #[arg(long, default_value_t = 60_000)]
    window_ms: u64,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = LimiterConfig::new(args.strategy, args.limit, args.window_ms);
    let limiter = Arc::new(Limiter::from_config(&config)?);

    info!(
        strategy = %config.strategy,
        limit = config.limit,
        window_ms = config.window_ms,
        "Limiter initialized"
    );

    let app = Router::new()
        .route("/limited", get(limited))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&limiter),
            enforce_admission,
        ))
        .route("/unlimited", get(unlimited));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    limiter.stop().await;
    info!("Admission engine stopped");
    Ok(())
}

async fn limited() -> &'static str {
    "Limited endpoint - requests are admission-controlled\n"
}

async fn unlimited() -> &'static str {
    "Unlimited endpoint - no admission control\n"
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
