use blog_api::{auth::TokenCodec, config::Config, db, rest, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let tokens = TokenCodec::new(config.secret.as_deref());
    if !tokens.is_configured() {
        tracing::warn!("SECRET is not set; sign-in and every protected route will be refused");
    }
    if !config.cookie_secure {
        tracing::warn!("session cookie is issued without the Secure flag; set COOKIE_SECURE=true behind TLS");
    }

    let app = rest::router(AppState::new(pool, tokens, config.cookie_secure));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("REST API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
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

    tracing::info!("shutting down");
}
