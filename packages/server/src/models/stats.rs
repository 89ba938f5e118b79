use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ReleaseStats {
    pub total: u64,
    pub active: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ManifestRequestStats {
    pub total: u64,
    pub last_24h: u64,
    pub last_7d: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorStats {
    pub last_24h: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StorageStats {
    pub asset_count: u64,
    pub total_bytes: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    pub releases: ReleaseStats,
    pub manifest_requests: ManifestRequestStats,
    pub update_errors: ErrorStats,
    pub storage: StorageStats,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub storage: &'static str,
}
