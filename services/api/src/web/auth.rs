//! services/api/src/web/auth.rs
//!
//! Session endpoints: login, the one-tap demo login, logout, and the signed-in
//! student's profile.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use campus_core::domain::{EmergencyContact, User, UserUpdate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ApiResult;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub roll_number: String,
    pub password: String,
}

/// Profile fields the student may change. Omitted fields are left as they are.
#[derive(Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub course: Option<String>,
    pub branch: Option<String>,
    pub semester: Option<u8>,
    pub year: Option<u8>,
    pub profile_photo: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub emergency_contact: Option<EmergencyContact>,
}

impl From<ProfileUpdateRequest> for UserUpdate {
    fn from(req: ProfileUpdateRequest) -> Self {
        UserUpdate {
            name: req.name,
            email: req.email,
            course: req.course,
            branch: req.branch,
            semester: req.semester,
            year: req.year,
            profile_photo: req.profile_photo,
            phone: req.phone,
            address: req.address,
            emergency_contact: req.emergency_contact,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

async fn sign_in(state: &AppState, roll_number: &str, password: &str) -> ApiResult<Json<User>> {
    let user = state.auth.authenticate(roll_number, password).await?;
    let user = state.service.with_store(|s| s.login(user)).await;
    info!(user_id = %user.id, roll_number = %user.roll_number, "User signed in");
    Ok(Json(user))
}

/// POST /auth/login - Sign in with roll number and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; returns the profile"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<User>> {
    sign_in(&state, &req.roll_number, &req.password).await
}

/// POST /auth/demo-login - Sign in as the demo student
#[utoipa::path(
    post,
    path = "/auth/demo-login",
    responses((status = 200, description = "Login successful; returns the profile"))
)]
pub async fn demo_login_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<User>> {
    sign_in(&state, "demo", "demo").await
}

/// POST /auth/logout - Sign out and drop the student's data
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logout successful"))
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.service.with_store(|s| s.logout()).await;
    info!("User signed out");
    StatusCode::NO_CONTENT
}

/// GET /me - The signed-in student's profile
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The profile"),
        (status = 401, description = "No active session")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// PATCH /me - Update profile fields
#[utoipa::path(
    patch,
    path = "/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "The updated profile"),
        (status = 401, description = "No active session")
    )
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<User>> {
    let update = UserUpdate::from(req);
    let user = state.service.with_store(|s| s.update_user(update)).await?;
    Ok(Json(user))
}
