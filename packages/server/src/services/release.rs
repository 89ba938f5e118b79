use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::entity::{channel, deployment_event, release, release_asset, runtime_version};
use crate::error::AppError;
use crate::services::webhook::ReleaseSummary;
use crate::state::AppState;

/// Finds the single active release for a deployment key, if any.
///
/// At most one release per (platform, channel, runtime version) is active at
/// a time; ordering by creation time makes the query deterministic even if
/// that invariant is ever violated by hand-edited data.
pub async fn find_active_release<C: ConnectionTrait>(
    db: &C,
    platform: &str,
    channel: &str,
    runtime_version: &str,
) -> Result<Option<release::Model>, AppError> {
    let found = release::Entity::find()
        .filter(release::Column::Platform.eq(platform))
        .filter(release::Column::Channel.eq(channel))
        .filter(release::Column::RuntimeVersion.eq(runtime_version))
        .filter(release::Column::IsActive.eq(true))
        .order_by_desc(release::Column::CreatedAt)
        .one(db)
        .await?;
    Ok(found)
}

/// Inserts the channel row if it does not exist yet.
pub async fn ensure_channel<C: ConnectionTrait>(db: &C, name: &str) -> Result<(), AppError> {
    let now = Utc::now();
    let model = channel::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    match channel::Entity::insert(model)
        .on_conflict(OnConflict::column(channel::Column::Name).do_nothing().to_owned())
        .exec_without_returning(db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Inserts the runtime version row if it does not exist yet.
pub async fn ensure_runtime_version<C: ConnectionTrait>(
    db: &C,
    version: &str,
) -> Result<(), AppError> {
    let model = runtime_version::ActiveModel {
        version: Set(version.to_string()),
        min_app_version: Set(None),
        deprecated_at: Set(None),
        created_at: Set(Utc::now()),
    };
    match runtime_version::Entity::insert(model)
        .on_conflict(
            OnConflict::column(runtime_version::Column::Version)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Deactivates every active release sharing a deployment key.
///
/// Runs inside the caller's transaction so a following activation is atomic
/// with it.
pub async fn deactivate_key<C: ConnectionTrait>(
    db: &C,
    platform: &str,
    channel: &str,
    runtime_version: &str,
) -> Result<(), AppError> {
    release::Entity::update_many()
        .col_expr(release::Column::IsActive, Expr::value(false))
        .col_expr(release::Column::DeactivatedAt, Expr::value(Some(Utc::now())))
        .filter(release::Column::Platform.eq(platform))
        .filter(release::Column::Channel.eq(channel))
        .filter(release::Column::RuntimeVersion.eq(runtime_version))
        .filter(release::Column::IsActive.eq(true))
        .exec(db)
        .await?;
    Ok(())
}

/// Marks a single release active inside the caller's transaction. The caller
/// must have deactivated competing releases first.
pub async fn activate_release<C: ConnectionTrait>(
    db: &C,
    model: release::Model,
) -> Result<release::Model, AppError> {
    let mut active: release::ActiveModel = model.into();
    active.is_active = Set(true);
    active.activated_at = Set(Some(Utc::now()));
    active.deactivated_at = Set(None);
    Ok(active.update(db).await?)
}

async fn find_release<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<release::Model, AppError> {
    release::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Release {id} not found")))
}

/// Activates a release, deactivating any other release for the same
/// deployment key in the same transaction.
pub async fn activate(db: &DatabaseConnection, id: Uuid) -> Result<release::Model, AppError> {
    let txn = db.begin().await?;
    let model = find_release(&txn, id).await?;
    deactivate_key(&txn, &model.platform, &model.channel, &model.runtime_version).await?;
    let updated = activate_release(&txn, model).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deactivates a release, leaving its deployment key with no active release.
pub async fn deactivate(db: &DatabaseConnection, id: Uuid) -> Result<release::Model, AppError> {
    let txn = db.begin().await?;
    let model = find_release(&txn, id).await?;
    let mut active: release::ActiveModel = model.into();
    active.is_active = Set(false);
    active.deactivated_at = Set(Some(Utc::now()));
    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Creates a new release that is a copy of an existing one and activates it.
///
/// The clone gets a fresh id and its own asset mappings, so deleting the
/// source release later cannot break the rollback.
pub async fn rollback(state: &AppState, id: Uuid) -> Result<release::Model, AppError> {
    let txn = state.db.begin().await?;
    let source = find_release(&txn, id).await?;

    let now = Utc::now();
    let clone_id = Uuid::new_v4();
    let clone = release::ActiveModel {
        id: Set(clone_id),
        runtime_version: Set(source.runtime_version.clone()),
        platform: Set(source.platform.clone()),
        channel: Set(source.channel.clone()),
        git_commit: Set(source.git_commit.clone()),
        git_branch: Set(source.git_branch.clone()),
        message: Set(Some(format!("Rollback to release {id}"))),
        is_active: Set(false),
        is_rollback: Set(true),
        rollback_from_id: Set(Some(source.id)),
        launch_asset_hash: Set(source.launch_asset_hash.clone()),
        manifest_json: Set(source.manifest_json.clone()),
        created_at: Set(now),
        activated_at: Set(None),
        deactivated_at: Set(None),
    };
    release::Entity::insert(clone).exec_without_returning(&txn).await?;

    let mappings = release_asset::Entity::find()
        .filter(release_asset::Column::ReleaseId.eq(source.id))
        .all(&txn)
        .await?;
    for mapping in mappings {
        let copy = release_asset::ActiveModel {
            release_id: Set(clone_id),
            asset_hash: Set(mapping.asset_hash),
            asset_key: Set(mapping.asset_key),
            is_launch_asset: Set(mapping.is_launch_asset),
        };
        release_asset::Entity::insert(copy).exec_without_returning(&txn).await?;
    }

    deactivate_key(&txn, &source.platform, &source.channel, &source.runtime_version).await?;
    let clone = find_release(&txn, clone_id).await?;
    let activated = activate_release(&txn, clone).await?;
    txn.commit().await?;

    state
        .webhook
        .notify("release.rollback", ReleaseSummary::from(&activated));
    Ok(activated)
}

/// Removes a release together with its asset mappings and events. Asset
/// blobs stay in place until the garbage collector finds them unreferenced.
pub async fn delete_release(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let txn = db.begin().await?;
    release_asset::Entity::delete_many()
        .filter(release_asset::Column::ReleaseId.eq(id))
        .exec(&txn)
        .await?;
    deployment_event::Entity::delete_many()
        .filter(deployment_event::Column::ReleaseId.eq(id))
        .exec(&txn)
        .await?;
    let result = release::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("Release {id} not found")));
    }
    txn.commit().await?;
    Ok(())
}
