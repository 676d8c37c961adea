use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info, warn};

use tapak::logging::{init_tracing, shutdown_tracer};
use tapak::metrics::{init_metrics, metrics_app, metrics_port};
use tapak::router::init_router;
use tapak::state::init_app_state;

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}

fn run_migrations_enabled() -> bool {
    std::env::var("RUN_MIGRATIONS")
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("Failed to initialise logging")?;

    let state = init_app_state().await?;

    if run_migrations_enabled() {
        sqlx::migrate!("./migrations")
            .run(&state.db)
            .await
            .context("Failed to run migrations")?;
        info!("Migrations applied");
    }

    match init_metrics() {
        Ok(Some(handle)) => {
            let metrics_addr = SocketAddr::from(([0, 0, 0, 0], metrics_port()));
            let listener = tokio::net::TcpListener::bind(metrics_addr)
                .await
                .context("Failed to bind metrics listener")?;
            info!("📊 Metrics available at http://{}/metrics", metrics_addr);
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                    error!(error = %e, "Metrics server stopped");
                }
            });
        }
        Ok(None) => info!("Observability disabled, metrics listener not started"),
        Err(e) => warn!(error = %e, "Failed to install metrics recorder, continuing without metrics"),
    }

    let address = state.app_config.bind_address();
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("🚀 Server running on http://{}", address);
    info!("📚 Swagger UI available at http://{}/swagger-ui", address);
    info!("📖 Scalar UI available at http://{}/scalar", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}
