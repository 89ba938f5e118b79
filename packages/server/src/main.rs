use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemBlobStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database::init_db;
use server::services::webhook::WebhookNotifier;
use server::signer::ManifestSigner;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .context("Failed to create data directory")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;

    let assets = FilesystemBlobStore::new(
        config.storage.data_dir.join("assets"),
        config.storage.max_blob_size,
    )
    .await
    .context("Failed to initialize asset store")?;

    // Refusing to start without signing material beats serving unsigned
    // manifests that clients will reject.
    let signer = ManifestSigner::load(&config.keys.keys_dir)
        .context("Failed to load manifest signing keys")?;

    let webhook = WebhookNotifier::new(&config.webhook);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config: Arc::new(config),
        assets: Arc::new(assets),
        signer: Arc::new(signer),
        webhook: Arc::new(webhook),
    };

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Update server listening at http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
