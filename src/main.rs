use std::sync::Arc;

use action_suggest::api::{build_router, AppState};
use action_suggest::records::{synthetic, InMemoryRecordStore};
use action_suggest::suggestions::SuggestionService;
use action_suggest::{logging, Config};
use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;
    logging::init(&config.logging);

    let store = InMemoryRecordStore::new();
    if let Some(path) = &config.store.seed_file {
        store
            .load_json_file(path)
            .with_context(|| format!("failed to seed records from {}", path.display()))?;
    }
    if config.store.synthetic_records > 0 {
        store.extend(synthetic::generate(
            config.store.synthetic_records,
            config.store.synthetic_seed,
        ));
    }
    info!(
        "Record store ready: {} records across {} users",
        store.len(),
        store.user_count()
    );

    let suggestions = SuggestionService::from_config(&config)
        .context("failed to initialize suggestion generator")?;
    info!(
        "Ranking strategies: {}",
        config
            .ranking
            .strategies
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let state = AppState {
        records: Arc::new(store),
        suggestions: Arc::new(suggestions),
        ranking: Arc::new(config.ranking.clone()),
    };
    let app = build_router(state, config.server.max_body_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
