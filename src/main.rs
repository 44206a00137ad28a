use std::sync::Arc;

use gemini_chess::api::router::create_router;
use gemini_chess::api::state::AppState;
use gemini_chess::config::AppConfig;
use gemini_chess::suggest::{MoveSuggester, RandomSuggester, create_suggester};

#[tokio::main]
async fn main() {
    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_chess=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr();

    let suggester = create_suggester(&config).unwrap_or_else(|e| {
        tracing::warn!("suggester '{}' unavailable ({e}), using random moves", config.suggester);
        Arc::new(RandomSuggester) as Arc<dyn MoveSuggester>
    });
    tracing::info!(
        suggester = suggester.name(),
        max_attempts = config.max_attempts,
        "external opponent ready"
    );

    let state = AppState::new(config, suggester);
    let app = create_router(state);

    tracing::info!(
        "gemini-chess v{} starting on {bind_addr}",
        env!("CARGO_PKG_VERSION")
    );

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {bind_addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
