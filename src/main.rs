use anyhow::Context;
use bq_dashboard::{
    AppState, Args,
    core::engine::{BigQueryEngine, QueryEngine},
    router,
};
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let catalog = args.load_catalog().context("Failed to load query catalog")?;
    match &args.catalog {
        Some(path) => info!("Loaded {} queries from {}", catalog.len(), path.display()),
        None => info!("Using built-in catalog with {} queries", catalog.len()),
    }

    let engine = BigQueryEngine::connect(
        &args.project,
        args.credentials.as_deref(),
        args.query_timeout(),
    )
    .await
    .context("Failed to create BigQuery client")?;
    info!(
        "Running queries in project {} with a {}s timeout",
        engine.project_id(),
        args.query_timeout_secs
    );

    let engine: Arc<dyn QueryEngine> = Arc::new(engine);
    let app = router(AppState::new(catalog, engine, args.query_timeout()));

    let bind_addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    info!("Server running on http://{bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
