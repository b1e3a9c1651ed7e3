//! Biometric gateway server.
//!
//! Reads `BIOMETRIC__*` configuration, connects to PostgreSQL and serves the
//! verification API until Ctrl+C or SIGTERM.

use std::sync::Arc;

use http::HeaderValue;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use biometric_gateway::adapters::http::middleware::ApiKeyState;
use biometric_gateway::adapters::http::{verification_router, VerificationAppState};
use biometric_gateway::adapters::postgres::{PostgresSessionRepository, PostgresUserRepository};
use biometric_gateway::adapters::sumsub::SumsubAdapter;
use biometric_gateway::config::{AppConfig, ServerConfig};
use biometric_gateway::domain::verification::SignatureVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        sandbox = config.provider.is_sandbox(),
        "Starting biometric gateway"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let provider = SumsubAdapter::new(config.provider.sumsub_config())?;

    let state = VerificationAppState {
        sessions: Arc::new(PostgresSessionRepository::new(pool.clone())),
        users: Arc::new(PostgresUserRepository::new(pool)),
        provider: Arc::new(provider),
        levels: config.provider.levels(),
        callback_verifier: SignatureVerifier::new(config.provider.webhook_secret.clone()),
        api_key: ApiKeyState::new(config.security.api_key.clone()),
        max_image_bytes: config.limits.max_image_bytes,
    };

    let app = verification_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server));

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// JSON logs in production, human-readable output elsewhere.
fn init_tracing(server: &ServerConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.json_logs() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}

/// Configured origins, or any origin when none are set.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
