//! Recurring appointment template model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use dentora_core::error::CoreError;
use dentora_core::recurrence::{Frequency, RecurrenceRule};
use dentora_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `recurring_appointments` table.
///
/// The template a dentist sets up once; the engine materializes it into
/// concrete `appointments` rows over the rolling horizon.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecurringAppointment {
    pub id: DbId,
    pub tenant_id: DbId,
    pub dentist_id: DbId,
    pub patient_id: DbId,
    pub operatory_id: Option<DbId>,
    /// One of DAILY, WEEKLY, BIWEEKLY, MONTHLY, QUARTERLY, YEARLY.
    pub frequency: String,
    /// "Every N units". The column is `repeat_interval` because `interval`
    /// is a reserved word in Postgres; the API name stays `interval`.
    #[serde(rename = "interval")]
    pub repeat_interval: i32,
    /// Weekday indices, 0 = Sunday.
    pub days_of_week: Vec<i16>,
    pub time_of_day: NaiveTime,
    pub duration_minutes: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub procedure_type: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RecurringAppointment {
    /// Rebuild the validated [`RecurrenceRule`] from the stored columns.
    ///
    /// The row was validated on the way in, so a parse failure here means
    /// the stored data is corrupt and surfaces as an internal error.
    pub fn rule(&self) -> Result<RecurrenceRule, CoreError> {
        let frequency: Frequency = self
            .frequency
            .parse()
            .map_err(|_| CoreError::Internal(format!(
                "Stored frequency '{}' on pattern {} is not valid",
                self.frequency, self.id
            )))?;
        RecurrenceRule::new(
            frequency,
            self.repeat_interval,
            self.days_of_week.clone(),
            self.time_of_day,
            self.start_date,
            self.end_date,
        )
    }
}

/// DTO for inserting a new recurring appointment. Already validated at the
/// API boundary.
#[derive(Debug, Clone)]
pub struct CreateRecurringAppointment {
    pub tenant_id: DbId,
    pub dentist_id: DbId,
    pub patient_id: DbId,
    pub operatory_id: Option<DbId>,
    pub frequency: Frequency,
    pub repeat_interval: i32,
    pub days_of_week: Vec<i16>,
    pub time_of_day: NaiveTime,
    pub duration_minutes: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub procedure_type: String,
    pub notes: Option<String>,
}

/// Partial update of a recurring appointment's mutable fields. Identity
/// columns and `start_date` are immutable.
///
/// Nullable columns track presence separately from value: the outer
/// `Option` is "was the field in the request", the inner one is the new
/// value. `Some(None)` clears the column back to NULL, which is how an
/// end-dated series is restored to open-ended.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecurringFields {
    pub operatory_id: Option<Option<DbId>>,
    pub frequency: Option<Frequency>,
    pub repeat_interval: Option<i32>,
    pub days_of_week: Option<Vec<i16>>,
    pub time_of_day: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub end_date: Option<Option<NaiveDate>>,
    pub procedure_type: Option<String>,
    pub notes: Option<Option<String>>,
}

impl UpdateRecurringFields {
    /// Whether any field that shapes the occurrence set is being changed.
    /// These trigger a regeneration of future scheduled appointments.
    pub fn changes_schedule(&self) -> bool {
        self.frequency.is_some()
            || self.repeat_interval.is_some()
            || self.days_of_week.is_some()
            || self.time_of_day.is_some()
            || self.end_date.is_some()
    }
}
