//! Router assembly

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{api, auth, auth::AdminAuthConfig, state::AppState, ws};

pub fn build_router(state: Arc<AppState>, auth_config: Arc<AdminAuthConfig>) -> Router {
    let public_routes = Router::new()
        .route("/api/participants", get(api::list_participants))
        .route("/api/used-squads", get(api::list_used_squads))
        .route("/api/possible-squads", get(api::possible_squads))
        .route("/api/snapshot", get(api::snapshot));

    // Protected admin routes (with HTTP Basic Auth)
    let admin_routes = Router::new()
        .route("/admin", get(auth::serve_admin))
        .route("/api/admin/upload", post(api::upload_roster))
        .route("/api/admin/roster", post(api::import_roster))
        .route("/api/admin/redistribute", post(api::redistribute))
        .route("/api/admin/participants", post(api::add_participant))
        .route(
            "/api/admin/participants/squad",
            post(api::update_participant_squad),
        )
        .route(
            "/api/admin/participants/{id}",
            delete(api::remove_participant),
        )
        .route("/api/admin/reset", post(api::reset))
        .route("/api/admin/export", get(api::export_roster))
        .layer(middleware::from_fn_with_state(
            auth_config.clone(),
            auth::admin_auth_middleware,
        ));

    // Admin sessions on the WebSocket need credentials too
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            auth_config,
            auth::admin_ws_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(ws_routes)
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
