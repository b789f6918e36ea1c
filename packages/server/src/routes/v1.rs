use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::fragment::*;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/fragments", fragment_routes(config))
}

fn fragment_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_fragments, create_fragment))
        .routes(routes!(get_fragment, update_fragment, delete_fragment))
        .routes(routes!(get_fragment_info))
        .layer(fragment_body_limit(config.storage.max_blob_size))
}
