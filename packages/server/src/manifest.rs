use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::{asset, release, release_asset};
use crate::error::AppError;

/// A single downloadable file referenced by a manifest.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAsset {
    /// Stable key the client uses to address the asset ("bundle" for the
    /// launch asset, the file name for auxiliary assets).
    pub key: String,
    pub hash: String,
    pub file_extension: String,
    pub content_type: String,
    pub url: String,
}

/// The signed update manifest served to clients.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub runtime_version: String,
    pub launch_asset: ManifestAsset,
    pub assets: Vec<ManifestAsset>,
    pub metadata: serde_json::Value,
    pub extra: serde_json::Value,
}

fn to_manifest_asset(mapping: &release_asset::Model, asset: &asset::Model, base_url: &str) -> ManifestAsset {
    ManifestAsset {
        key: mapping.asset_key.clone(),
        hash: asset.hash.clone(),
        file_extension: asset.file_extension.clone(),
        content_type: asset.content_type.clone(),
        url: format!("{base_url}/assets/{}", asset.hash),
    }
}

fn json_object_field(stored: &serde_json::Value, field: &str) -> serde_json::Value {
    match stored.get(field) {
        Some(value @ serde_json::Value::Object(_)) => value.clone(),
        _ => serde_json::Value::Object(serde_json::Map::new()),
    }
}

/// Assembles the manifest for a release from its asset mappings.
///
/// Fails with an integrity fault if a mapping points at a missing asset row
/// or the release has no launch asset, since serving such a manifest would
/// hand clients dead download URLs.
pub async fn build_manifest<C: ConnectionTrait>(
    db: &C,
    release: &release::Model,
    base_url: &str,
) -> Result<UpdateManifest, AppError> {
    let mappings = release_asset::Entity::find()
        .filter(release_asset::Column::ReleaseId.eq(release.id))
        .all(db)
        .await?;

    let hashes: Vec<String> = mappings.iter().map(|m| m.asset_hash.clone()).collect();
    let assets_by_hash: HashMap<String, asset::Model> = asset::Entity::find()
        .filter(asset::Column::Hash.is_in(hashes))
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.hash.clone(), a))
        .collect();

    let mut launch_asset = None;
    let mut assets = Vec::new();
    for mapping in &mappings {
        let asset = assets_by_hash.get(&mapping.asset_hash).ok_or_else(|| {
            AppError::IntegrityFault(format!(
                "Release {} references missing asset {}",
                release.id, mapping.asset_hash
            ))
        })?;
        let entry = to_manifest_asset(mapping, asset, base_url);
        if mapping.is_launch_asset {
            launch_asset = Some(entry);
        } else {
            assets.push(entry);
        }
    }

    let launch_asset = launch_asset.ok_or_else(|| {
        AppError::IntegrityFault(format!("Release {} has no launch asset", release.id))
    })?;

    Ok(UpdateManifest {
        id: release.id,
        created_at: release.created_at,
        runtime_version: release.runtime_version.clone(),
        launch_asset,
        assets,
        metadata: json_object_field(&release.manifest_json, "metadata"),
        extra: json_object_field(&release.manifest_json, "extra"),
    })
}
