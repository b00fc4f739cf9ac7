//! Repository for the `appointments` table.
//!
//! The engine only ever writes generated rows (those with a `recurring_id`);
//! manually booked appointments belong to the surrounding booking flow and
//! are never touched here.

use dentora_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::appointment::{Appointment, AppointmentStatus, NewGeneratedAppointment};

const COLUMNS: &str = "\
    id, tenant_id, dentist_id, patient_id, operatory_id, recurring_id, \
    appointment_date, duration_minutes, status, procedure_type, notes, \
    created_at, updated_at";

pub struct AppointmentRepo;

impl AppointmentRepo {
    /// Materialize one occurrence of a recurring template.
    ///
    /// The `uq_appointments_recurring_date` unique index is the
    /// de-duplication contract: if a row for (recurring_id,
    /// appointment_date) already exists -- including one inserted by a
    /// racing generation pass -- `ON CONFLICT DO NOTHING` turns the insert
    /// into a no-op and `None` is returned.
    pub async fn insert_generated(
        pool: &PgPool,
        input: &NewGeneratedAppointment,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "INSERT INTO appointments
                 (tenant_id, dentist_id, patient_id, operatory_id, recurring_id,
                  appointment_date, duration_minutes, status, procedure_type, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'scheduled', $8, $9)
             ON CONFLICT (recurring_id, appointment_date) WHERE recurring_id IS NOT NULL
             DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(input.tenant_id)
            .bind(input.dentist_id)
            .bind(input.patient_id)
            .bind(input.operatory_id)
            .bind(input.recurring_id)
            .bind(input.appointment_date)
            .bind(input.duration_minutes)
            .bind(&input.procedure_type)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// List a template's generated appointments from `from` onward,
    /// soonest first.
    pub async fn list_upcoming_for_pattern(
        pool: &PgPool,
        recurring_id: DbId,
        from: Timestamp,
        limit: i64,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM appointments
             WHERE recurring_id = $1 AND appointment_date >= $2
             ORDER BY appointment_date
             LIMIT $3"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(recurring_id)
            .bind(from)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Delete a template's future, still-SCHEDULED generated rows.
    ///
    /// Past rows and rows a human already moved off SCHEDULED survive; this
    /// is the destructive half of a schedule-change regeneration.
    pub async fn delete_future_scheduled(
        pool: &PgPool,
        recurring_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM appointments
             WHERE recurring_id = $1 AND appointment_date >= $2
               AND status = 'scheduled'",
        )
        .bind(recurring_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cancel (not delete) a template's future SCHEDULED rows. Used on
    /// pattern cancellation so the calendar keeps an explicit record.
    pub async fn cancel_future_scheduled(
        pool: &PgPool,
        recurring_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE appointments
             SET status = 'cancelled', updated_at = now()
             WHERE recurring_id = $1 AND appointment_date >= $2
               AND status = 'scheduled'",
        )
        .bind(recurring_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Set the status of a single appointment (front-desk action: completed,
    /// no-show, one-off cancellation). Returns `true` if a row was updated.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: AppointmentStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE appointments SET status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all rows generated for a template. Test/diagnostic helper.
    pub async fn count_for_pattern(
        pool: &PgPool,
        recurring_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM appointments WHERE recurring_id = $1")
                .bind(recurring_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
