use axum::extract::DefaultBodyLimit;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(release_routes())
        .merge(channel_routes())
        .merge(stats_routes())
        .merge(admin_routes())
}

fn release_routes() -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::release::list_releases))
        .routes(routes!(
            handlers::release::get_release,
            handlers::release::delete_release
        ))
        .routes(routes!(handlers::release::activate_release))
        .routes(routes!(handlers::release::deactivate_release))
        .routes(routes!(handlers::release::rollback_release))
        .routes(routes!(handlers::release::list_release_events));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload_release))
        .layer(DefaultBodyLimit::max(handlers::upload::MAX_UPLOAD_BODY_SIZE));

    crud.merge(upload)
}

fn channel_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::channel::list_channels,
            handlers::channel::create_channel
        ))
        .routes(routes!(handlers::channel::delete_channel))
}

fn stats_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::stats::get_stats))
        .routes(routes!(handlers::stats::get_recent_activity))
        .routes(routes!(handlers::stats::get_health))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::run_gc))
}
