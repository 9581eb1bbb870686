//! Paperfeed web server
//!
//! Run with: cargo run -p paperfeed-web

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paperfeed_config::Config;
use paperfeed_web::{router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(
                    "paperfeed_web=info,paperfeed_store=info,paperfeed_qa=info,paperfeed_llm=info,tower_http=info",
                )
            }),
        )
        .init();

    let config = Config::load().context("loading configuration")?;
    info!(
        live = %config.paths.live_snapshot.display(),
        cache = %config.paths.cache_dir.display(),
        backend = %config.llm.backend,
        model = %config.llm.model,
        "Starting paperfeed"
    );

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
