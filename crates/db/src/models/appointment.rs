//! Concrete appointment model.
//!
//! The engine treats appointments as output artifacts: it creates SCHEDULED
//! rows from a recurring template and bulk-updates future ones on template
//! edits. Rows a human has already touched (COMPLETED, CANCELLED, NO_SHOW)
//! are never rewritten.

use dentora_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of a concrete appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

/// A row from the `appointments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Appointment {
    pub id: DbId,
    pub tenant_id: DbId,
    pub dentist_id: DbId,
    pub patient_id: DbId,
    pub operatory_id: Option<DbId>,
    /// Back-reference to the generating template; `NULL` for appointments
    /// booked by hand.
    pub recurring_id: Option<DbId>,
    pub appointment_date: Timestamp,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub procedure_type: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for materializing one occurrence of a recurring template.
#[derive(Debug, Clone)]
pub struct NewGeneratedAppointment {
    pub tenant_id: DbId,
    pub dentist_id: DbId,
    pub patient_id: DbId,
    pub operatory_id: Option<DbId>,
    pub recurring_id: DbId,
    pub appointment_date: Timestamp,
    pub duration_minutes: i32,
    pub procedure_type: String,
    pub notes: Option<String>,
}
