use buzzer::{config::DEFAULT_LOG_FILTER, AppError, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!(host = %config.host, port = config.port, "Starting buzzer server");

    // Rooms and connections live only as long as the process
    let app_state = AppState::in_memory();
    let app = buzzer::app(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Server running on {}", config.bind_address());
    axum::serve(listener, app).await?;

    Ok(())
}
