use std::net::SocketAddr;

use dotenvy::dotenv;
use scribe::logging::{init_tracing, shutdown_tracer};
use scribe::metrics::{init_metrics, metrics_app, metrics_port};
use scribe::router::init_router;
use scribe::scribe_config::ServerConfig;
use scribe::scribe_db::run_migrations;
use scribe::state::init_app_state;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Some(handle) = init_metrics() {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port()));
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    info!(%addr, "Metrics server listening");
                    if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                        error!(error = %e, "Metrics server stopped");
                    }
                }
                Err(e) => warn!(error = %e, %addr, "Failed to bind metrics server"),
            }
        });
    }

    let state = match init_app_state().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = format!("{e:#}"), "Failed to initialize application state");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&state.db).await {
        error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    let cache = state.cache.clone();
    let app = init_router(state);

    let address = ServerConfig::from_env().address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %address, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(%address, "Server running");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        error!(error = %e, "Server error");
    }

    if let Some(cache) = cache {
        cache.shutdown().await;
    }
    shutdown_tracer().await;
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
