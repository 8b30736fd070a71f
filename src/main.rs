use crate::{
    configuration::Configuration, configuration_handler::ConfigurationHandler, http::create_app,
    local_reservations::LocalReservations,
};
use axum::Router;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod availability;
mod backend;
mod calendar;
mod configuration;
mod configuration_handler;
#[cfg(feature = "postgres")]
mod database_interface;
mod engine;
mod error;
mod http;
mod local_reservations;
mod policy;
#[cfg(feature = "postgres")]
mod schema;
mod slots;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let configuration = ConfigurationHandler::parse_arguments()?;
    if configuration.operators().is_empty() {
        warn!("No operators configured; manual reservations and cancellations are unavailable");
    }

    let address = format!("{}:{}", configuration.bind_address(), configuration.port());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "Slot booking listening");

    let app = build_app(configuration).await;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Slot booking stopped");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_app(configuration: ConfigurationHandler) -> Router {
    use crate::database_interface::DatabaseInterface;
    use std::time::Duration;
    use tokio::time::sleep;
    use tracing::error;

    let Some(database_url) = configuration.database_url() else {
        info!("No database configured; reservations are kept in memory");
        return create_app(LocalReservations::default(), configuration);
    };
    let backend = loop {
        match DatabaseInterface::new(&database_url) {
            Ok(backend) => {
                info!("Successfully connected to database");
                break backend;
            }
            Err(err) => {
                error!(?err, "Failed to establish database connection. Retry in 1 sec.");
                sleep(Duration::from_secs(1)).await;
            }
        }
    };
    create_app(backend, configuration)
}

#[cfg(not(feature = "postgres"))]
async fn build_app(configuration: ConfigurationHandler) -> Router {
    if configuration.database_url().is_some() {
        warn!("DATABASE_URL is set but this build has no postgres support; reservations are kept in memory");
    } else {
        info!("No database configured; reservations are kept in memory");
    }
    create_app(LocalReservations::default(), configuration)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(?err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(?err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
