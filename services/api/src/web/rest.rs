//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the directory, preference, bookmark,
//! notification, search-history and storage endpoints, and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ApiResult};
use crate::persistence::WriteStatus;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use campus_core::directory::{
    nearby_locations, resolve_bookmarks, room_availability_for_location, BookmarkedLocation,
    LocationWithDistance, DEFAULT_NEARBY_LIMIT,
};
use campus_core::domain::{
    Bookmark, Coordinates, Language, Location, NewNotification, Notification, NotificationKind,
    Preferences,
};
use campus_core::schedule::RoomAvailability;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_locations_handler,
        nearby_locations_handler,
        get_location_handler,
        location_availability_handler,
        get_preferences_handler,
        set_language_handler,
        toggle_dark_mode_handler,
        list_bookmarks_handler,
        add_bookmark_handler,
        toggle_bookmark_handler,
        remove_bookmark_handler,
        list_notifications_handler,
        add_notification_handler,
        mark_notification_read_handler,
        mark_all_notifications_read_handler,
        clear_notifications_handler,
        list_searches_handler,
        add_search_handler,
        clear_searches_handler,
        storage_status_handler,
        storage_retry_handler,
        crate::web::auth::login_handler,
        crate::web::auth::demo_login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::me_handler,
        crate::web::auth::update_me_handler,
        crate::web::schedule::list_schedule_handler,
        crate::web::schedule::add_class_handler,
        crate::web::schedule::clear_schedule_handler,
        crate::web::schedule::week_view_handler,
        crate::web::schedule::periods_handler,
        crate::web::schedule::update_class_handler,
        crate::web::schedule::remove_class_handler,
        crate::web::schedule::room_availability_handler,
    ),
    components(
        schemas(
            HealthResponse,
            LanguageRequest,
            BookmarkRequest,
            BookmarkToggleResponse,
            NotificationRequest,
            NotificationsResponse,
            MarkedResponse,
            SearchRequest,
            RetryResponse,
            WriteStatus,
            crate::web::auth::LoginRequest,
            crate::web::auth::ProfileUpdateRequest,
            crate::web::schedule::ClassRequest,
            crate::web::schedule::ClassUpdateRequest,
            crate::web::schedule::DaySchedule,
        )
    ),
    tags(
        (name = "Campus Navigator API", description = "Local bridge to the campus navigation store.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// Case-insensitive text to match against name, description, building and room.
    pub q: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Deserialize, ToSchema)]
pub struct LanguageRequest {
    /// `en` or `hi`.
    pub language: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequest {
    pub location_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct BookmarkToggleResponse {
    pub bookmarked: bool,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub title: String,
    pub message: String,
    /// One of `class`, `event`, `alert`, `general`.
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: NotificationKind,
    pub location_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsResponse {
    #[schema(value_type = Vec<Object>)]
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct MarkedResponse {
    pub marked: usize,
}

#[derive(Deserialize, ToSchema)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Serialize, ToSchema)]
pub struct RetryResponse {
    pub retried: bool,
    pub status: WriteStatus,
}

//=========================================================================================
// Health
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

//=========================================================================================
// Campus Directory
//=========================================================================================

/// List all campus locations, or those matching `q`.
#[utoipa::path(
    get,
    path = "/locations",
    params(LocationQuery),
    responses((status = 200, description = "Matching locations"))
)]
pub async fn list_locations_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Json<Vec<Location>> {
    let locations = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.directory.search_locations(q),
        _ => state.directory.all_locations(),
    };
    Json(locations)
}

/// Locations ordered by distance from the given position.
#[utoipa::path(
    get,
    path = "/locations/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Closest locations first"),
        (status = 400, description = "Only one of lat/lon was given")
    )
)]
pub async fn nearby_locations_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<Json<Vec<LocationWithDistance>>> {
    let from = match (query.lat, query.lon) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        (None, None) => None,
        _ => {
            return Err(ApiError::BadRequest(
                "lat and lon must be given together".to_string(),
            ))
        }
    };
    let limit = query.limit.unwrap_or(DEFAULT_NEARBY_LIMIT);
    Ok(Json(nearby_locations(state.directory.as_ref(), from, limit)))
}

#[utoipa::path(
    get,
    path = "/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "The location"),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_location_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Location>> {
    state
        .directory
        .get_location_by_id(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("location {id}")))
}

/// Whether the room a location refers to is free right now.
#[utoipa::path(
    get,
    path = "/locations/{id}/availability",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Current availability"),
        (status = 400, description = "The location is not a bookable room"),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn location_availability_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RoomAvailability>> {
    if state.directory.get_location_by_id(&id).is_none() {
        return Err(ApiError::NotFound(format!("location {id}")));
    }
    let now = state.campus_now();
    let availability = state
        .service
        .read(|s| {
            room_availability_for_location(state.directory.as_ref(), s.class_schedule(), &id, now)
        })
        .await;
    availability
        .map(Json)
        .ok_or_else(|| ApiError::BadRequest(format!("location {id} is not a room")))
}

//=========================================================================================
// Preferences
//=========================================================================================

#[utoipa::path(
    get,
    path = "/preferences",
    responses((status = 200, description = "Current language and theme"))
)]
pub async fn get_preferences_handler(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    Json(state.service.read(|s| s.preferences()).await)
}

#[utoipa::path(
    put,
    path = "/preferences/language",
    request_body = LanguageRequest,
    responses(
        (status = 200, description = "Updated preferences"),
        (status = 400, description = "Unsupported language")
    )
)]
pub async fn set_language_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LanguageRequest>,
) -> ApiResult<Json<Preferences>> {
    let language: Language = req.language.parse().map_err(ApiError::BadRequest)?;
    let preferences = state
        .service
        .with_store(|s| {
            s.set_language(language);
            s.preferences()
        })
        .await;
    Ok(Json(preferences))
}

#[utoipa::path(
    post,
    path = "/preferences/dark-mode/toggle",
    responses((status = 200, description = "Updated preferences"))
)]
pub async fn toggle_dark_mode_handler(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    let preferences = state
        .service
        .with_store(|s| {
            s.toggle_dark_mode();
            s.preferences()
        })
        .await;
    Json(preferences)
}

//=========================================================================================
// Bookmarks
//=========================================================================================

/// Bookmarks in the order they were added, each with its location.
#[utoipa::path(
    get,
    path = "/bookmarks",
    responses((status = 200, description = "Bookmarked locations"))
)]
pub async fn list_bookmarks_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<BookmarkedLocation>> {
    let bookmarks = state.service.read(|s| s.bookmarks().to_vec()).await;
    Json(resolve_bookmarks(state.directory.as_ref(), &bookmarks))
}

fn ensure_location_exists(state: &AppState, location_id: &str) -> ApiResult<()> {
    match state.directory.get_location_by_id(location_id) {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("location {location_id}"))),
    }
}

#[utoipa::path(
    post,
    path = "/bookmarks",
    request_body = BookmarkRequest,
    responses(
        (status = 201, description = "The bookmark (existing one if already bookmarked)"),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn add_bookmark_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookmarkRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_location_exists(&state, &req.location_id)?;
    let bookmark: Bookmark = state
        .service
        .with_store(|s| s.add_bookmark(&req.location_id))
        .await;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

#[utoipa::path(
    post,
    path = "/bookmarks/toggle",
    request_body = BookmarkRequest,
    responses(
        (status = 200, description = "Whether the location is now bookmarked", body = BookmarkToggleResponse),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn toggle_bookmark_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookmarkRequest>,
) -> ApiResult<Json<BookmarkToggleResponse>> {
    ensure_location_exists(&state, &req.location_id)?;
    let bookmarked = state
        .service
        .with_store(|s| s.toggle_bookmark(&req.location_id))
        .await;
    Ok(Json(BookmarkToggleResponse { bookmarked }))
}

#[utoipa::path(
    delete,
    path = "/bookmarks/{id}",
    params(("id" = String, Path, description = "Bookmark id")),
    responses((status = 204, description = "Removed, or already absent"))
)]
pub async fn remove_bookmark_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let removed = state.service.with_store(|s| s.remove_bookmark(&id)).await;
    debug!(bookmark = %id, removed, "Bookmark removal");
    StatusCode::NO_CONTENT
}

//=========================================================================================
// Notifications
//=========================================================================================

/// Newest first.
#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "Notifications and unread count", body = NotificationsResponse))
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
) -> Json<NotificationsResponse> {
    let response = state
        .service
        .read(|s| NotificationsResponse {
            notifications: s.notifications().to_vec(),
            unread_count: s.unread_notification_count(),
        })
        .await;
    Json(response)
}

#[utoipa::path(
    post,
    path = "/notifications",
    request_body = NotificationRequest,
    responses((status = 201, description = "The stored notification"))
)]
pub async fn add_notification_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NotificationRequest>,
) -> impl IntoResponse {
    let notification = state
        .service
        .with_store(|s| {
            s.add_notification(NewNotification {
                title: req.title,
                message: req.message,
                kind: req.kind,
                location_id: req.location_id,
            })
        })
        .await;
    (StatusCode::CREATED, Json(notification))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses((status = 204, description = "Marked as read, or unknown id ignored"))
)]
pub async fn mark_notification_read_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let marked = state
        .service
        .with_store(|s| s.mark_notification_as_read(&id))
        .await;
    debug!(notification = %id, marked, "Notification marked read");
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    responses((status = 200, description = "How many were unread", body = MarkedResponse))
)]
pub async fn mark_all_notifications_read_handler(
    State(state): State<Arc<AppState>>,
) -> Json<MarkedResponse> {
    let marked = state
        .service
        .with_store(|s| s.mark_all_notifications_as_read())
        .await;
    Json(MarkedResponse { marked })
}

#[utoipa::path(
    delete,
    path = "/notifications",
    responses((status = 204, description = "All notifications removed"))
)]
pub async fn clear_notifications_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.service.with_store(|s| s.clear_notifications()).await;
    StatusCode::NO_CONTENT
}

//=========================================================================================
// Recent Searches
//=========================================================================================

#[utoipa::path(
    get,
    path = "/searches",
    responses((status = 200, description = "Most recent first", body = Vec<String>))
)]
pub async fn list_searches_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.service.read(|s| s.recent_searches().to_vec()).await)
}

/// Remember a search query. Blank queries are ignored.
#[utoipa::path(
    post,
    path = "/searches",
    request_body = SearchRequest,
    responses((status = 200, description = "The updated history", body = Vec<String>))
)]
pub async fn add_search_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<Vec<String>> {
    let searches = state
        .service
        .with_store(|s| {
            s.add_recent_search(&req.query);
            s.recent_searches().to_vec()
        })
        .await;
    Json(searches)
}

#[utoipa::path(
    delete,
    path = "/searches",
    responses((status = 204, description = "History cleared"))
)]
pub async fn clear_searches_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.service.with_store(|s| s.clear_recent_searches()).await;
    StatusCode::NO_CONTENT
}

//=========================================================================================
// Storage
//=========================================================================================

#[utoipa::path(
    get,
    path = "/storage/status",
    responses((status = 200, description = "Outcome of the last durable write", body = WriteStatus))
)]
pub async fn storage_status_handler(State(state): State<Arc<AppState>>) -> Json<WriteStatus> {
    Json(state.service.write_status())
}

/// Retry the last failed durable write, if any.
#[utoipa::path(
    post,
    path = "/storage/retry",
    responses((status = 200, description = "Whether a retry was scheduled", body = RetryResponse))
)]
pub async fn storage_retry_handler(State(state): State<Arc<AppState>>) -> Json<RetryResponse> {
    let retried = state.service.retry_failed_write();
    if retried {
        info!("Retrying failed snapshot write");
    }
    Json(RetryResponse {
        retried,
        status: state.service.write_status(),
    })
}
