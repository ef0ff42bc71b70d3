//! REST service for meter stock and field installations.
//!
//! - [`routes`]: axum router under `/api`
//! - [`auth`]: JWT bearer auth and role checks
//! - [`meters`] and [`installations`]: stock assignment and status sync
//! - [`database`]: document store over Redis, or memory when no URL is set
//! - [`mail`] and [`images`]: credential emails and photo hosting
use std::sync::Arc;

use models::{Role, payloads::UserInput};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod images;
pub mod installations;
pub mod mail;
pub mod meters;
pub mod routes;
pub mod state;
pub mod utils;

pub use routes::build_router;
use database::UserRecord;
use error::AppError;
use state::{AppState, StartupError};

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;
    bootstrap_admin(&state).await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

/// Creates the configured admin while no account exists yet.
pub async fn bootstrap_admin(state: &Arc<AppState>) -> Result<(), AppError> {
    let Some(seed) = &state.config.admin else {
        return Ok(());
    };

    if !state.database.list::<UserRecord>().await?.is_empty() {
        return Ok(());
    }

    let draft = UserInput {
        username: Some(seed.username.clone()),
        password: Some(seed.password.clone()),
        name: Some(seed.name.clone()),
        role: Some(Role::Admin),
        ..UserInput::default()
    }
    .validate_new()?;

    let admin = auth::create_account(state, draft).await?;
    info!(username = %admin.username, "Initial admin created");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
}
