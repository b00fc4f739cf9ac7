//! Handlers for the `/recurring-appointments` resource.
//!
//! Thin adapters over [`crate::engine::recurrence`]: they authenticate,
//! validate the schedule shape at the boundary, and translate between JSON
//! and engine types. All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use dentora_core::recurrence::{parse_time_of_day, Frequency, RecurrenceRule};
use dentora_core::types::DbId;
use serde::Deserialize;
use validator::Validate;

use dentora_db::models::recurring::{CreateRecurringAppointment, UpdateRecurringFields};

use crate::engine::recurrence as engine;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

fn default_interval() -> i32 {
    1
}

/// Body for `POST /recurring-appointments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRecurringRequest {
    pub patient_id: DbId,
    pub operatory_id: Option<DbId>,
    /// DAILY | WEEKLY | BIWEEKLY | MONTHLY | QUARTERLY | YEARLY.
    pub frequency: String,
    /// "Every N units". Defaults to 1.
    #[serde(default = "default_interval")]
    #[validate(range(min = 1))]
    pub interval: i32,
    /// Weekday indices, 0 = Sunday. Consulted for daily/weekly/biweekly.
    pub days_of_week: Vec<i16>,
    /// Wall-clock `HH:MM`, interpreted as UTC.
    pub time_of_day: String,
    #[validate(range(min = 15))]
    pub duration_minutes: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub procedure_type: String,
    pub notes: Option<String>,
}

/// Deserialize a field that distinguishes "absent" from "explicitly null":
/// absent leaves the column untouched, `null` clears it.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Body for `PUT /recurring-appointments/{id}`. All fields optional;
/// identity fields and `start_date` are immutable. The nullable fields
/// (`operatory_id`, `end_date`, `notes`) accept an explicit `null` to clear
/// the stored value, e.g. restoring an end-dated series to open-ended.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRecurringRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub operatory_id: Option<Option<DbId>>,
    pub frequency: Option<String>,
    #[validate(range(min = 1))]
    pub interval: Option<i32>,
    pub days_of_week: Option<Vec<i16>>,
    pub time_of_day: Option<String>,
    #[validate(range(min = 15))]
    pub duration_minutes: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub procedure_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// Query parameters for `GET /recurring-appointments`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict to one patient's patterns.
    pub patient_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/recurring-appointments
///
/// Create a recurring appointment pattern and immediately materialize its
/// occurrences over the generation horizon. Returns 201 with the pattern and
/// its upcoming appointments.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateRecurringRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    let frequency: Frequency = req.frequency.parse()?;
    let time_of_day = parse_time_of_day(&req.time_of_day)?;
    // Full schedule-shape validation before anything is persisted.
    RecurrenceRule::new(
        frequency,
        req.interval,
        req.days_of_week.clone(),
        time_of_day,
        req.start_date,
        req.end_date,
    )?;

    let input = CreateRecurringAppointment {
        tenant_id: auth.tenant_id,
        dentist_id: auth.dentist_id,
        patient_id: req.patient_id,
        operatory_id: req.operatory_id,
        frequency,
        repeat_interval: req.interval,
        days_of_week: req.days_of_week,
        time_of_day,
        duration_minutes: req.duration_minutes,
        start_date: req.start_date,
        end_date: req.end_date,
        procedure_type: req.procedure_type,
        notes: req.notes,
    };

    let result = engine::create_pattern(&state.pool, input, state.config.horizon_months).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": result })),
    ))
}

/// GET /api/v1/recurring-appointments
///
/// List the authenticated dentist's patterns, each with its upcoming
/// generated appointments. Optional `patient_id` filter.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let patterns = engine::list_patterns(
        &state.pool,
        auth.dentist_id,
        auth.tenant_id,
        params.patient_id,
    )
    .await?;
    Ok(Json(serde_json::json!({ "data": patterns })))
}

/// GET /api/v1/recurring-appointments/{id}
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let result = engine::get_pattern(&state.pool, id, auth.dentist_id, auth.tenant_id).await?;
    Ok(Json(serde_json::json!({ "data": result })))
}

/// PUT /api/v1/recurring-appointments/{id}
///
/// Update a pattern. Schedule-shaping changes (frequency, interval, weekday
/// set, time of day, end date) regenerate future SCHEDULED appointments;
/// cosmetic changes only touch the template.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(req): Json<UpdateRecurringRequest>,
) -> AppResult<Json<serde_json::Value>> {
    req.validate()?;

    let frequency = match &req.frequency {
        Some(s) => Some(s.parse::<Frequency>()?),
        None => None,
    };
    let time_of_day = match &req.time_of_day {
        Some(s) => Some(parse_time_of_day(s)?),
        None => None,
    };

    let changes = UpdateRecurringFields {
        operatory_id: req.operatory_id,
        frequency,
        repeat_interval: req.interval,
        days_of_week: req.days_of_week,
        time_of_day,
        duration_minutes: req.duration_minutes,
        end_date: req.end_date,
        procedure_type: req.procedure_type,
        notes: req.notes,
    };

    let result = engine::update_pattern(
        &state.pool,
        id,
        auth.dentist_id,
        auth.tenant_id,
        changes,
        state.config.horizon_months,
    )
    .await?;
    Ok(Json(serde_json::json!({ "data": result })))
}

/// DELETE /api/v1/recurring-appointments/{id}
///
/// Soft-cancel: deactivate the pattern and cancel its future SCHEDULED
/// appointments. Returns 204 No Content.
pub async fn cancel(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    engine::cancel_pattern(&state.pool, id, auth.dentist_id, auth.tenant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/recurring-appointments/{id}/generate
///
/// Force a fresh generation pass over the horizon (e.g. after a long period
/// without schedule edits). Safe to call repeatedly.
pub async fn generate(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let created = engine::manual_generate(
        &state.pool,
        id,
        auth.dentist_id,
        auth.tenant_id,
        state.config.horizon_months,
    )
    .await?;
    Ok(Json(serde_json::json!({
        "data": { "appointments_created": created }
    })))
}
