use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::webhook::WebhookNotifier;
use crate::signer::ManifestSigner;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub assets: Arc<dyn BlobStore>,
    pub signer: Arc<ManifestSigner>,
    pub webhook: Arc<WebhookNotifier>,
}
