mod v1;

use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    // The update protocol and asset downloads live at the root so deployed
    // clients keep short, stable URLs; the admin API is versioned.
    OpenApiRouter::new()
        .routes(routes!(handlers::manifest::get_manifest))
        .routes(routes!(handlers::manifest::report_event))
        .routes(routes!(handlers::assets::download_asset))
        .nest("/api/v1", v1::routes())
}
