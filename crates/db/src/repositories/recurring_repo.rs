//! Repository for the `recurring_appointments` table.

use dentora_core::types::DbId;
use sqlx::PgPool;

use crate::models::recurring::{
    CreateRecurringAppointment, RecurringAppointment, UpdateRecurringFields,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, tenant_id, dentist_id, patient_id, operatory_id, frequency, \
    repeat_interval, days_of_week, time_of_day, duration_minutes, \
    start_date, end_date, procedure_type, notes, is_active, \
    created_at, updated_at";

/// CRUD for recurring appointment templates.
///
/// Every read used before a mutation is scoped by (dentist_id, tenant_id) so
/// patterns never leak across tenants; an out-of-scope id reads as absent.
pub struct RecurringRepo;

impl RecurringRepo {
    /// Insert a new template, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRecurringAppointment,
    ) -> Result<RecurringAppointment, sqlx::Error> {
        let query = format!(
            "INSERT INTO recurring_appointments
                 (tenant_id, dentist_id, patient_id, operatory_id, frequency,
                  repeat_interval, days_of_week, time_of_day, duration_minutes,
                  start_date, end_date, procedure_type, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecurringAppointment>(&query)
            .bind(input.tenant_id)
            .bind(input.dentist_id)
            .bind(input.patient_id)
            .bind(input.operatory_id)
            .bind(input.frequency.as_str())
            .bind(input.repeat_interval)
            .bind(&input.days_of_week)
            .bind(input.time_of_day)
            .bind(input.duration_minutes)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.procedure_type)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// Find a template by id within the caller's (dentist, tenant) scope.
    pub async fn find_scoped(
        pool: &PgPool,
        id: DbId,
        dentist_id: DbId,
        tenant_id: DbId,
    ) -> Result<Option<RecurringAppointment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recurring_appointments
             WHERE id = $1 AND dentist_id = $2 AND tenant_id = $3"
        );
        sqlx::query_as::<_, RecurringAppointment>(&query)
            .bind(id)
            .bind(dentist_id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// List a dentist's templates, optionally filtered to one patient.
    /// Newest first.
    pub async fn list_scoped(
        pool: &PgPool,
        dentist_id: DbId,
        tenant_id: DbId,
        patient_id: Option<DbId>,
    ) -> Result<Vec<RecurringAppointment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recurring_appointments
             WHERE dentist_id = $1 AND tenant_id = $2
               AND ($3::bigint IS NULL OR patient_id = $3)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, RecurringAppointment>(&query)
            .bind(dentist_id)
            .bind(tenant_id)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }

    /// List every active template across all tenants. Drives the periodic
    /// horizon refresh.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<RecurringAppointment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recurring_appointments
             WHERE is_active = true
             ORDER BY id"
        );
        sqlx::query_as::<_, RecurringAppointment>(&query)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Only fields present in the request are
    /// written; for the nullable columns a present-but-`None` value clears
    /// the column (COALESCE cannot express that, hence the flag binds).
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_fields(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRecurringFields,
    ) -> Result<Option<RecurringAppointment>, sqlx::Error> {
        let query = format!(
            "UPDATE recurring_appointments SET
                 operatory_id = CASE WHEN $2 THEN $3 ELSE operatory_id END,
                 frequency = COALESCE($4, frequency),
                 repeat_interval = COALESCE($5, repeat_interval),
                 days_of_week = COALESCE($6, days_of_week),
                 time_of_day = COALESCE($7, time_of_day),
                 duration_minutes = COALESCE($8, duration_minutes),
                 end_date = CASE WHEN $9 THEN $10 ELSE end_date END,
                 procedure_type = COALESCE($11, procedure_type),
                 notes = CASE WHEN $12 THEN $13 ELSE notes END,
                 updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecurringAppointment>(&query)
            .bind(id)
            .bind(input.operatory_id.is_some())
            .bind(input.operatory_id.flatten())
            .bind(input.frequency.map(|f| f.as_str()))
            .bind(input.repeat_interval)
            .bind(&input.days_of_week)
            .bind(input.time_of_day)
            .bind(input.duration_minutes)
            .bind(input.end_date.is_some())
            .bind(input.end_date.flatten())
            .bind(&input.procedure_type)
            .bind(input.notes.is_some())
            .bind(input.notes.clone().flatten())
            .fetch_optional(pool)
            .await
    }

    /// Mark a template inactive (soft cancellation). The row is retained
    /// for history. Returns `true` if a row was flipped.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE recurring_appointments
             SET is_active = false, updated_at = now()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
