//! Materialization and lifecycle of recurring appointment series.
//!
//! Each operation is invoked synchronously per request (or by the periodic
//! horizon refresh). A generation pass walks the rolling window day-by-day,
//! so the work is bounded by `horizon_months` and independent of data size.
//! Passes are idempotent: the `uq_appointments_recurring_date` unique index
//! swallows duplicate inserts, so a pass that failed midway (or raced a
//! concurrent trigger) is safe to simply run again.
//!
//! The engine performs no double-booking checks against other appointments
//! in the same operatory or dentist slot; it is purely generative.

use chrono::{Months, Utc};
use dentora_core::error::CoreError;
use dentora_core::recurrence::RecurrenceRule;
use dentora_core::types::DbId;
use serde::Serialize;
use sqlx::PgPool;

use dentora_db::models::appointment::{Appointment, NewGeneratedAppointment};
use dentora_db::models::recurring::{
    CreateRecurringAppointment, RecurringAppointment, UpdateRecurringFields,
};
use dentora_db::repositories::{AppointmentRepo, DentistPatientRepo, RecurringRepo};

use crate::error::AppResult;

/// How many upcoming generated appointments are attached to pattern reads.
const UPCOMING_PREVIEW_LIMIT: i64 = 10;

/// A template together with its next upcoming generated appointments.
#[derive(Debug, Serialize)]
pub struct PatternWithAppointments {
    #[serde(flatten)]
    pub pattern: RecurringAppointment,
    pub appointments: Vec<Appointment>,
}

/// Create a new recurring appointment template and run the initial
/// generation pass.
///
/// Requires an active treatment relationship between the patient and the
/// authenticated dentist within the tenant; absence is a permission error,
/// not a not-found.
pub async fn create_pattern(
    pool: &PgPool,
    input: CreateRecurringAppointment,
    horizon_months: u32,
) -> AppResult<PatternWithAppointments> {
    let related = DentistPatientRepo::has_active_relation(
        pool,
        input.patient_id,
        input.dentist_id,
        input.tenant_id,
    )
    .await?;
    if !related {
        return Err(CoreError::Forbidden(format!(
            "No active treatment relationship between patient {} and dentist {}",
            input.patient_id, input.dentist_id
        ))
        .into());
    }

    let pattern = RecurringRepo::create(pool, &input).await?;
    let created = generate_occurrences(pool, &pattern, horizon_months).await?;

    tracing::info!(
        pattern_id = pattern.id,
        tenant_id = pattern.tenant_id,
        dentist_id = pattern.dentist_id,
        appointments_created = created,
        "Recurring appointment pattern created"
    );

    with_upcoming(pool, pattern).await
}

/// Materialize every occurrence of `pattern` inside the rolling horizon.
///
/// Walks from max(start_date, today) to min(today + horizon, end_date),
/// inserting a SCHEDULED appointment for each matching day. Occurrences
/// that already exist are skipped by the unique index, which is what makes
/// repeated calls (and concurrent callers) safe. Returns the number of rows
/// actually inserted.
///
/// No-op for inactive patterns.
pub async fn generate_occurrences(
    pool: &PgPool,
    pattern: &RecurringAppointment,
    horizon_months: u32,
) -> AppResult<u64> {
    if !pattern.is_active {
        return Ok(0);
    }

    let rule: RecurrenceRule = pattern.rule()?;
    let today = Utc::now().date_naive();
    let window_end = today + Months::new(horizon_months);

    let mut created = 0u64;
    for occurrence in rule.occurrences(today, window_end) {
        let row = NewGeneratedAppointment {
            tenant_id: pattern.tenant_id,
            dentist_id: pattern.dentist_id,
            patient_id: pattern.patient_id,
            operatory_id: pattern.operatory_id,
            recurring_id: pattern.id,
            appointment_date: occurrence.and_utc(),
            duration_minutes: pattern.duration_minutes,
            procedure_type: pattern.procedure_type.clone(),
            notes: pattern.notes.clone(),
        };
        if AppointmentRepo::insert_generated(pool, &row).await?.is_some() {
            created += 1;
        }
    }

    tracing::debug!(
        pattern_id = pattern.id,
        created,
        horizon_months,
        "Generation pass finished"
    );
    Ok(created)
}

/// Fetch a template within the caller's scope, with upcoming appointments.
pub async fn get_pattern(
    pool: &PgPool,
    id: DbId,
    dentist_id: DbId,
    tenant_id: DbId,
) -> AppResult<PatternWithAppointments> {
    let pattern = load_scoped(pool, id, dentist_id, tenant_id).await?;
    with_upcoming(pool, pattern).await
}

/// List the caller's templates (optionally for one patient), each with its
/// upcoming appointments attached for display.
pub async fn list_patterns(
    pool: &PgPool,
    dentist_id: DbId,
    tenant_id: DbId,
    patient_id: Option<DbId>,
) -> AppResult<Vec<PatternWithAppointments>> {
    let patterns = RecurringRepo::list_scoped(pool, dentist_id, tenant_id, patient_id).await?;
    let mut out = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        out.push(with_upcoming(pool, pattern).await?);
    }
    Ok(out)
}

/// Apply field changes to a template.
///
/// If any schedule-shaping field changed (frequency, interval, weekday set,
/// time of day, end date), all future still-SCHEDULED generated rows are
/// deleted and the horizon is regenerated. Rows that already occurred, or
/// that a human moved off SCHEDULED, are never touched. Cosmetic edits
/// (notes, procedure type, duration, operatory) update only the template;
/// already-materialized rows keep their original payload.
pub async fn update_pattern(
    pool: &PgPool,
    id: DbId,
    dentist_id: DbId,
    tenant_id: DbId,
    changes: UpdateRecurringFields,
    horizon_months: u32,
) -> AppResult<PatternWithAppointments> {
    let existing = load_scoped(pool, id, dentist_id, tenant_id).await?;

    // Validate the merged schedule before anything is persisted, so a
    // partial edit cannot leave a rule the engine can't evaluate.
    let merged_frequency = match changes.frequency {
        Some(f) => f,
        None => existing.frequency.parse()?,
    };
    RecurrenceRule::new(
        merged_frequency,
        changes.repeat_interval.unwrap_or(existing.repeat_interval),
        changes
            .days_of_week
            .clone()
            .unwrap_or_else(|| existing.days_of_week.clone()),
        changes.time_of_day.unwrap_or(existing.time_of_day),
        existing.start_date,
        // Present-but-None means the end date is being cleared.
        match changes.end_date {
            Some(end) => end,
            None => existing.end_date,
        },
    )?;

    let schedule_changed = changes.changes_schedule();
    let pattern = RecurringRepo::update_fields(pool, id, &changes)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Recurring appointment",
            id,
        })?;

    if schedule_changed {
        let now = Utc::now();
        let removed = AppointmentRepo::delete_future_scheduled(pool, id, now).await?;
        let created = generate_occurrences(pool, &pattern, horizon_months).await?;
        tracing::info!(
            pattern_id = id,
            removed,
            created,
            "Schedule changed, future appointments regenerated"
        );
    }

    with_upcoming(pool, pattern).await
}

/// Soft-cancel a template: deactivate it and cancel (not delete) its future
/// SCHEDULED generated appointments. Past appointments and the template row
/// itself are retained for history.
pub async fn cancel_pattern(
    pool: &PgPool,
    id: DbId,
    dentist_id: DbId,
    tenant_id: DbId,
) -> AppResult<()> {
    load_scoped(pool, id, dentist_id, tenant_id).await?;

    RecurringRepo::deactivate(pool, id).await?;
    let cancelled = AppointmentRepo::cancel_future_scheduled(pool, id, Utc::now()).await?;

    tracing::info!(
        pattern_id = id,
        cancelled,
        "Recurring appointment pattern cancelled"
    );
    Ok(())
}

/// Operator re-entry point: force a fresh generation pass for one template.
/// Identical semantics to the pass run at creation time.
pub async fn manual_generate(
    pool: &PgPool,
    id: DbId,
    dentist_id: DbId,
    tenant_id: DbId,
    horizon_months: u32,
) -> AppResult<u64> {
    let pattern = load_scoped(pool, id, dentist_id, tenant_id).await?;
    generate_occurrences(pool, &pattern, horizon_months).await
}

/// Scoped read used before every mutation. An id outside the caller's
/// (dentist, tenant) scope reads the same as a missing one, so existence
/// never leaks across tenants.
async fn load_scoped(
    pool: &PgPool,
    id: DbId,
    dentist_id: DbId,
    tenant_id: DbId,
) -> AppResult<RecurringAppointment> {
    RecurringRepo::find_scoped(pool, id, dentist_id, tenant_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Recurring appointment",
                id,
            }
            .into()
        })
}

async fn with_upcoming(
    pool: &PgPool,
    pattern: RecurringAppointment,
) -> AppResult<PatternWithAppointments> {
    let appointments = AppointmentRepo::list_upcoming_for_pattern(
        pool,
        pattern.id,
        Utc::now(),
        UPCOMING_PREVIEW_LIMIT,
    )
    .await?;
    Ok(PatternWithAppointments {
        pattern,
        appointments,
    })
}
