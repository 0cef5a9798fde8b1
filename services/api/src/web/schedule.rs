//! services/api/src/web/schedule.rs
//!
//! Handlers for the personal timetable and room availability.
//!
//! Request bodies carry times as `HH:MM` strings and days as 0 (Sunday) to
//! 6 (Saturday); both are validated here before they reach the store.

use crate::error::{ApiError, ApiResult};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use campus_core::domain::{
    ClassScheduleEntry, ClassScheduleUpdate, DayOfWeek, NewClassSchedule, TimeOfDay,
};
use campus_core::schedule::{
    color_for_label, entries_for_day, period_starting_at, room_availability, week_view, Period,
    RoomAvailability, TIME_PERIODS,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassRequest {
    pub name: String,
    pub room: String,
    pub building: String,
    /// `HH:MM`, 24-hour.
    pub start_time: String,
    pub end_time: String,
    pub day_of_week: u8,
    pub instructor: Option<String>,
}

impl TryFrom<ClassRequest> for NewClassSchedule {
    type Error = ApiError;

    fn try_from(req: ClassRequest) -> Result<Self, Self::Error> {
        Ok(NewClassSchedule {
            name: req.name,
            room: req.room,
            building: req.building,
            start_time: TimeOfDay::parse(&req.start_time)?,
            end_time: TimeOfDay::parse(&req.end_time)?,
            day_of_week: DayOfWeek::new(req.day_of_week)?,
            instructor: req.instructor,
        })
    }
}

/// Every field is optional; omitted fields keep their current value.
#[derive(Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdateRequest {
    pub name: Option<String>,
    pub room: Option<String>,
    pub building: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub day_of_week: Option<u8>,
    pub instructor: Option<String>,
}

impl TryFrom<ClassUpdateRequest> for ClassScheduleUpdate {
    type Error = ApiError;

    fn try_from(req: ClassUpdateRequest) -> Result<Self, Self::Error> {
        Ok(ClassScheduleUpdate {
            name: req.name,
            room: req.room,
            building: req.building,
            start_time: req.start_time.as_deref().map(TimeOfDay::parse).transpose()?,
            end_time: req.end_time.as_deref().map(TimeOfDay::parse).transpose()?,
            day_of_week: req.day_of_week.map(DayOfWeek::new).transpose()?,
            instructor: req.instructor,
        })
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    /// Only classes on this day, sorted by start time.
    pub day: Option<u8>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoomQuery {
    pub room: String,
    pub building: String,
    /// Defaults to today on the campus clock.
    pub day: Option<u8>,
    /// `HH:MM`; defaults to the current campus time.
    pub time: Option<String>,
}

/// A class as drawn on the weekly grid.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCard {
    #[serde(flatten)]
    pub entry: ClassScheduleEntry,
    pub color: &'static str,
    /// The teaching period the class starts in, when it is aligned to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u8>,
}

impl From<ClassScheduleEntry> for ClassCard {
    fn from(entry: ClassScheduleEntry) -> Self {
        Self {
            color: color_for_label(&entry.name),
            period: period_starting_at(&entry.start_time).map(|p| p.id),
            entry,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub day_of_week: u8,
    pub name: String,
    #[schema(value_type = Vec<Object>)]
    pub classes: Vec<ClassCard>,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/schedule",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Classes, all or for one day"),
        (status = 400, description = "Day out of range")
    )
)]
pub async fn list_schedule_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduleQuery>,
) -> ApiResult<Json<Vec<ClassScheduleEntry>>> {
    let day = query.day.map(DayOfWeek::new).transpose()?;
    let entries = state
        .service
        .read(|s| match day {
            Some(day) => entries_for_day(s.class_schedule(), day),
            None => s.class_schedule().to_vec(),
        })
        .await;
    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/schedule",
    request_body = ClassRequest,
    responses(
        (status = 201, description = "The stored class"),
        (status = 400, description = "Malformed time, day or interval"),
        (status = 409, description = "The room is already taken at that time")
    )
)]
pub async fn add_class_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClassRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_class = NewClassSchedule::try_from(req)?;
    let entry = state
        .service
        .with_store(|s| s.add_class_schedule(new_class))
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/schedule",
    responses((status = 204, description = "Timetable cleared"))
)]
pub async fn clear_schedule_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state
        .service
        .with_store(|s| s.clear_all_class_schedules())
        .await;
    StatusCode::NO_CONTENT
}

/// Seven days, Sunday first, each sorted by start time.
#[utoipa::path(
    get,
    path = "/schedule/week",
    responses((status = 200, description = "The weekly grid", body = Vec<DaySchedule>))
)]
pub async fn week_view_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DaySchedule>> {
    let week = state.service.read(|s| week_view(s.class_schedule())).await;
    let days = DayOfWeek::ALL
        .into_iter()
        .zip(week)
        .map(|(day, entries)| DaySchedule {
            day_of_week: day.value(),
            name: day.name().to_string(),
            classes: entries.into_iter().map(ClassCard::from).collect(),
        })
        .collect();
    Json(days)
}

#[utoipa::path(
    get,
    path = "/schedule/periods",
    responses((status = 200, description = "The institute's teaching periods"))
)]
pub async fn periods_handler() -> Json<Vec<Period>> {
    Json(TIME_PERIODS.to_vec())
}

#[utoipa::path(
    patch,
    path = "/schedule/{id}",
    params(("id" = String, Path, description = "Class id")),
    request_body = ClassUpdateRequest,
    responses(
        (status = 200, description = "The updated class"),
        (status = 400, description = "Malformed time, day or interval"),
        (status = 404, description = "Unknown class"),
        (status = 409, description = "The room is already taken at that time")
    )
)]
pub async fn update_class_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ClassUpdateRequest>,
) -> ApiResult<Json<ClassScheduleEntry>> {
    let update = ClassScheduleUpdate::try_from(req)?;
    state
        .service
        .with_store(|s| s.update_class_schedule(&id, update))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("class {id}")))
}

#[utoipa::path(
    delete,
    path = "/schedule/{id}",
    params(("id" = String, Path, description = "Class id")),
    responses((status = 204, description = "Removed, or already absent"))
)]
pub async fn remove_class_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let removed = state
        .service
        .with_store(|s| s.remove_class_schedule(&id))
        .await;
    debug!(class = %id, removed, "Class removal");
    StatusCode::NO_CONTENT
}

/// Whether a room is free on a given day and time, per the stored timetable.
#[utoipa::path(
    get,
    path = "/rooms/availability",
    params(RoomQuery),
    responses(
        (status = 200, description = "Availability of the room"),
        (status = 400, description = "Malformed time or day")
    )
)]
pub async fn room_availability_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> ApiResult<Json<RoomAvailability>> {
    let now = state.campus_now();
    let day = match query.day {
        Some(day) => DayOfWeek::new(day)?,
        None => DayOfWeek::from_weekday(now.weekday()),
    };
    let time = match query.time.as_deref() {
        Some(time) => TimeOfDay::parse(time)?,
        None => TimeOfDay::from_naive_time(now.time()),
    };
    let availability = state
        .service
        .read(|s| room_availability(s.class_schedule(), &query.room, &query.building, day, &time))
        .await;
    Ok(Json(availability))
}
