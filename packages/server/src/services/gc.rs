use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::storage::{BlobStore, ContentHash, StorageError};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;

use crate::entity::{asset, release_asset};
use crate::error::AppError;

/// Outcome of a garbage collection sweep.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SweepReport {
    /// Number of asset rows examined.
    pub scanned: u64,
    /// Number of orphaned assets removed.
    pub removed: u64,
    /// Total size of the removed blobs.
    pub bytes_freed: u64,
}

/// Deletes asset blobs and rows no release references anymore.
///
/// Only assets older than the grace period are considered, so an upload that
/// has stored its blobs but not yet committed its release row cannot lose
/// them. Each candidate is re-checked against the mapping table immediately
/// before deletion to narrow the race with concurrent uploads further.
pub async fn sweep(
    db: &DatabaseConnection,
    store: &Arc<dyn BlobStore>,
    grace_period: Duration,
) -> Result<SweepReport, AppError> {
    let referenced: HashSet<String> = release_asset::Entity::find()
        .select_only()
        .column(release_asset::Column::AssetHash)
        .distinct()
        .into_tuple::<String>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let cutoff = Utc::now()
        - chrono::Duration::from_std(grace_period)
            .map_err(|e| AppError::Internal(format!("Invalid grace period: {e}")))?;
    let candidates = asset::Entity::find()
        .filter(asset::Column::CreatedAt.lt(cutoff))
        .all(db)
        .await?;

    let mut report = SweepReport {
        scanned: candidates.len() as u64,
        removed: 0,
        bytes_freed: 0,
    };

    for candidate in candidates {
        if referenced.contains(&candidate.hash) {
            continue;
        }

        // A release may have started referencing this asset since the scan.
        let refs = release_asset::Entity::find()
            .filter(release_asset::Column::AssetHash.eq(candidate.hash.clone()))
            .count(db)
            .await?;
        if refs > 0 {
            continue;
        }

        let hash = ContentHash::from_hex(&candidate.hash)
            .map_err(|_| AppError::IntegrityFault(format!("Malformed asset hash {}", candidate.hash)))?;
        match store.delete(&hash).await {
            // Missing blob: the row is stale either way, drop it.
            Ok(_) | Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        asset::Entity::delete_by_id(candidate.hash.clone()).exec(db).await?;
        report.removed += 1;
        report.bytes_freed += candidate.size_bytes as u64;
        tracing::debug!(hash = %candidate.hash, "removed orphaned asset");
    }

    tracing::info!(
        scanned = report.scanned,
        removed = report.removed,
        bytes_freed = report.bytes_freed,
        "garbage collection sweep finished"
    );
    Ok(report)
}
