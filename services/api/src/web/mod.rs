pub mod auth;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod schedule;
pub mod state;
pub mod ws_handler;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::require_session;
pub use rest::ApiDoc;
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Builds the complete application: REST routes, the `/ws` change feed and
/// the Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/locations", get(rest::list_locations_handler))
        .route("/locations/nearby", get(rest::nearby_locations_handler))
        .route("/locations/{id}", get(rest::get_location_handler))
        .route(
            "/locations/{id}/availability",
            get(rest::location_availability_handler),
        )
        .route("/preferences", get(rest::get_preferences_handler))
        .route("/preferences/language", put(rest::set_language_handler))
        .route(
            "/preferences/dark-mode/toggle",
            post(rest::toggle_dark_mode_handler),
        )
        .route(
            "/bookmarks",
            get(rest::list_bookmarks_handler).post(rest::add_bookmark_handler),
        )
        .route("/bookmarks/toggle", post(rest::toggle_bookmark_handler))
        .route("/bookmarks/{id}", delete(rest::remove_bookmark_handler))
        .route(
            "/notifications",
            get(rest::list_notifications_handler)
                .post(rest::add_notification_handler)
                .delete(rest::clear_notifications_handler),
        )
        .route(
            "/notifications/read-all",
            post(rest::mark_all_notifications_read_handler),
        )
        .route(
            "/notifications/{id}/read",
            post(rest::mark_notification_read_handler),
        )
        .route(
            "/searches",
            get(rest::list_searches_handler)
                .post(rest::add_search_handler)
                .delete(rest::clear_searches_handler),
        )
        .route(
            "/schedule",
            get(schedule::list_schedule_handler)
                .post(schedule::add_class_handler)
                .delete(schedule::clear_schedule_handler),
        )
        .route("/schedule/week", get(schedule::week_view_handler))
        .route("/schedule/periods", get(schedule::periods_handler))
        .route(
            "/schedule/{id}",
            patch(schedule::update_class_handler).delete(schedule::remove_class_handler),
        )
        .route(
            "/rooms/availability",
            get(schedule::room_availability_handler),
        )
        .route("/storage/status", get(rest::storage_status_handler))
        .route("/storage/retry", post(rest::storage_retry_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/demo-login", post(auth::demo_login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/ws", get(ws_handler));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/me", get(auth::me_handler).patch(auth::update_me_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = cors_layer(&state.config.cors_origin);

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!(%origin, "Ignoring invalid CORS origin: {}", e);
            cors
        }
    }
}
