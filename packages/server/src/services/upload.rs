use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Utc;
use common::storage::{BoxReader, StoredBlob};
use sea_orm::{
    ActiveValue::Set, DbErr, EntityTrait, TransactionTrait, sea_query::OnConflict,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::entity::{asset, release, release_asset};
use crate::error::AppError;
use crate::models::upload::UploadParams;
use crate::services::release::{
    activate_release, deactivate_key, ensure_channel, ensure_runtime_version,
};
use crate::services::webhook::ReleaseSummary;
use crate::state::AppState;
use crate::utils::paths::is_safe_relative_path;

/// Descriptor file every export archive must carry at its root.
const METADATA_FILE: &str = "metadata.json";

/// Maximum decompressed size per file inside an export archive (256 MB).
const MAX_DECOMPRESSED_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum total decompressed size across all files in an export archive (2048 MB).
const MAX_TOTAL_DECOMPRESSED_SIZE: u64 = 2048 * 1024 * 1024;

/// Per-platform file listing from an export's `metadata.json`.
#[derive(Deserialize)]
struct PlatformFiles {
    /// Relative path of the launch bundle inside the archive.
    bundle: String,
    /// Relative paths of auxiliary assets (images, fonts, ...).
    #[serde(default)]
    assets: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportMetadata {
    file_metadata: HashMap<String, PlatformFiles>,
}

fn extract_archive(data: &[u8], dest: &Path) -> Result<(), AppError> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| AppError::InvalidExport(format!("Invalid ZIP archive: {e}")))?;

    let mut total_decompressed: u64 = 0;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| AppError::InvalidExport(format!("ZIP read error: {e}")))?;

        if file.is_dir() {
            continue;
        }

        // Reject entries with path traversal components (e.g. "../").
        let name = match file.enclosed_name() {
            Some(path) => path,
            None => continue,
        };

        let target = dest.join(&name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Internal(format!("Failed to prepare scratch dir: {e}")))?;
        }

        let mut buf = Vec::new();
        file.by_ref()
            .take(MAX_DECOMPRESSED_FILE_SIZE + 1)
            .read_to_end(&mut buf)
            .map_err(|e| {
                AppError::InvalidExport(format!("Failed to read '{}': {e}", name.display()))
            })?;
        if buf.len() as u64 > MAX_DECOMPRESSED_FILE_SIZE {
            return Err(AppError::InvalidExport(format!(
                "File '{}' exceeds maximum decompressed size of 256MB",
                name.display()
            )));
        }

        total_decompressed += buf.len() as u64;
        if total_decompressed > MAX_TOTAL_DECOMPRESSED_SIZE {
            return Err(AppError::InvalidExport(
                "Total decompressed archive content exceeds 2048MB limit".into(),
            ));
        }

        std::fs::write(&target, &buf)
            .map_err(|e| AppError::Internal(format!("Failed to write scratch file: {e}")))?;
    }

    Ok(())
}

fn read_metadata(root: &Path) -> Result<ExportMetadata, AppError> {
    let raw = std::fs::read(root.join(METADATA_FILE))
        .map_err(|_| AppError::InvalidExport("Archive is missing metadata.json".into()))?;
    serde_json::from_slice(&raw)
        .map_err(|e| AppError::InvalidExport(format!("Invalid metadata.json: {e}")))
}

fn resolve_export_path(root: &Path, relative: &str) -> Result<PathBuf, AppError> {
    if !is_safe_relative_path(relative) {
        return Err(AppError::InvalidExport(format!(
            "Unsafe file path in metadata.json: '{relative}'"
        )));
    }
    let path = root.join(relative);
    if !path.is_file() {
        return Err(AppError::InvalidExport(format!(
            "metadata.json references missing file '{relative}'"
        )));
    }
    Ok(path)
}

/// Stores one exported file in the blob store and upserts its asset row.
async fn store_asset(
    state: &AppState,
    path: &Path,
    content_type: &str,
    file_extension: &str,
) -> Result<StoredBlob, AppError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to open scratch file: {e}")))?;
    let reader: BoxReader = Box::new(file);
    let stored = state.assets.put_stream(reader).await?;

    let model = asset::ActiveModel {
        hash: Set(stored.hash.to_hex()),
        file_path: Set(stored.hash.to_hex()),
        content_type: Set(content_type.to_string()),
        file_extension: Set(file_extension.to_string()),
        size_bytes: Set(stored.size as i64),
        created_at: Set(Utc::now()),
    };
    match asset::Entity::insert(model)
        .on_conflict(OnConflict::column(asset::Column::Hash).do_nothing().to_owned())
        .exec_without_returning(&state.db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(stored),
        Err(e) => Err(e.into()),
    }
}

fn guess_content_type(path: &Path) -> (String, String) {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| ".bin".to_string());
    let content_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string();
    (content_type, extension)
}

struct PendingAsset {
    hash: String,
    key: String,
    is_launch_asset: bool,
}

/// Ingests an export archive and creates an active release from it.
///
/// Assets are content-addressed, so files shared with earlier releases are
/// stored once. The release row, its asset mappings and the activation swap
/// are committed in a single transaction; on any failure before commit the
/// previously active release stays in place.
pub async fn process_upload(
    state: &AppState,
    params: UploadParams,
    archive: Vec<u8>,
) -> Result<Uuid, AppError> {
    let scratch = tempfile::tempdir()
        .map_err(|e| AppError::Internal(format!("Failed to create scratch dir: {e}")))?;
    let root = scratch.path().to_path_buf();

    let extract_root = root.clone();
    tokio::task::spawn_blocking(move || extract_archive(&archive, &extract_root))
        .await
        .map_err(|e| AppError::Internal(format!("Extraction task failed: {e}")))??;

    let metadata = read_metadata(&root)?;
    let platform = params.platform.as_str();
    let files = metadata.file_metadata.get(platform).ok_or_else(|| {
        AppError::UnsupportedPlatform(format!(
            "Export contains no files for platform '{platform}'"
        ))
    })?;

    let bundle_path = resolve_export_path(&root, &files.bundle)?;
    let stored_bundle =
        store_asset(state, &bundle_path, "application/javascript", ".js").await?;

    let mut pending = vec![PendingAsset {
        hash: stored_bundle.hash.to_hex(),
        key: "bundle".to_string(),
        is_launch_asset: true,
    }];

    for relative in &files.assets {
        let path = resolve_export_path(&root, relative)?;
        let (content_type, extension) = guess_content_type(&path);
        let stored = store_asset(state, &path, &content_type, &extension).await?;
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(relative)
            .to_string();
        pending.push(PendingAsset {
            hash: stored.hash.to_hex(),
            key,
            is_launch_asset: false,
        });
    }

    ensure_channel(&state.db, &params.channel).await?;
    ensure_runtime_version(&state.db, &params.runtime_version).await?;

    let release_id = Uuid::new_v4();
    let txn = state.db.begin().await?;

    let model = release::ActiveModel {
        id: Set(release_id),
        runtime_version: Set(params.runtime_version.clone()),
        platform: Set(platform.to_string()),
        channel: Set(params.channel.clone()),
        git_commit: Set(params.git_commit.clone()),
        git_branch: Set(params.git_branch.clone()),
        message: Set(Some(
            params
                .message
                .clone()
                .unwrap_or_else(|| "Uploaded release".to_string()),
        )),
        is_active: Set(false),
        is_rollback: Set(false),
        rollback_from_id: Set(None),
        launch_asset_hash: Set(stored_bundle.hash.to_hex()),
        manifest_json: Set(json!({})),
        created_at: Set(Utc::now()),
        activated_at: Set(None),
        deactivated_at: Set(None),
    };
    release::Entity::insert(model).exec_without_returning(&txn).await?;

    for entry in pending {
        let mapping = release_asset::ActiveModel {
            release_id: Set(release_id),
            asset_hash: Set(entry.hash),
            asset_key: Set(entry.key),
            is_launch_asset: Set(entry.is_launch_asset),
        };
        release_asset::Entity::insert(mapping).exec_without_returning(&txn).await?;
    }

    deactivate_key(&txn, platform, &params.channel, &params.runtime_version).await?;
    let inserted = release::Entity::find_by_id(release_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::Internal("Inserted release vanished".into()))?;
    let activated = activate_release(&txn, inserted).await?;
    txn.commit().await?;

    state
        .webhook
        .notify("release.created", ReleaseSummary::from(&activated));

    tracing::info!(
        release_id = %release_id,
        platform,
        channel = %params.channel,
        runtime_version = %params.runtime_version,
        "release created"
    );
    Ok(release_id)
}
