//! Recurring appointment rules and occurrence enumeration.
//!
//! A [`RecurrenceRule`] describes how a recurring appointment series
//! repeats: frequency, interval ("every N units"), weekday set, wall-clock
//! time, and an inclusive date window. [`RecurrenceRule::occurrences`] walks
//! the calendar day-by-day and yields the concrete date-times the series
//! falls on. All wall-clock values are interpreted as UTC.
//!
//! Weekday indices use 0 = Sunday .. 6 = Saturday. The weekday filter only
//! applies to [`Frequency::Daily`], [`Frequency::Weekly`] and
//! [`Frequency::Biweekly`]; the date-pinned frequencies (monthly and up)
//! repeat on the start date's day-of-month and ignore the weekday set.
//! Months that do not contain the pinned day are skipped, never clamped:
//! a day-31 monthly series has no February occurrence.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default forward generation window, in months.
pub const DEFAULT_HORIZON_MONTHS: u32 = 3;

/// Minimum appointment duration, in minutes.
pub const MIN_DURATION_MINUTES: i32 = 15;

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

/// How often a recurring appointment series repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// Canonical uppercase name, as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// Whether the weekday set participates in occurrence matching.
    ///
    /// Monthly, quarterly and yearly series are pinned to the start date's
    /// day-of-month instead.
    pub fn uses_days_of_week(self) -> bool {
        matches!(
            self,
            Frequency::Daily | Frequency::Weekly | Frequency::Biweekly
        )
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "BIWEEKLY" => Ok(Frequency::Biweekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "QUARTERLY" => Ok(Frequency::Quarterly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(CoreError::Validation(format!(
                "Unknown frequency '{other}'. Expected one of: \
                 DAILY, WEEKLY, BIWEEKLY, MONTHLY, QUARTERLY, YEARLY"
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Boundary validation helpers
// ---------------------------------------------------------------------------

/// Parse a wall-clock `HH:MM` string (24-hour) into a [`NaiveTime`].
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| CoreError::Validation(format!("Invalid time_of_day '{s}'. Expected HH:MM")))
}

/// Validate a weekday index set: every entry in 0..=6 (0 = Sunday).
pub fn validate_days_of_week(days: &[i16]) -> Result<(), CoreError> {
    if let Some(bad) = days.iter().find(|d| !(0..=6).contains(*d)) {
        return Err(CoreError::Validation(format!(
            "Invalid weekday index {bad}. Expected 0 (Sunday) through 6 (Saturday)"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RecurrenceRule
// ---------------------------------------------------------------------------

/// A validated recurrence schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// "Every N units" multiplier. Always >= 1.
    pub interval: i32,
    /// Weekday indices (0 = Sunday). Consulted for daily/weekly/biweekly only.
    pub days_of_week: Vec<i16>,
    pub time_of_day: NaiveTime,
    /// Date the series becomes effective. Pins the day-of-month for
    /// monthly/quarterly/yearly frequencies.
    pub start_date: NaiveDate,
    /// Inclusive end of the series. `None` = open-ended.
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Build a rule, rejecting malformed schedule shapes before anything
    /// touches storage.
    pub fn new(
        frequency: Frequency,
        interval: i32,
        days_of_week: Vec<i16>,
        time_of_day: NaiveTime,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, CoreError> {
        if interval < 1 {
            return Err(CoreError::Validation(format!(
                "interval must be >= 1, got {interval}"
            )));
        }
        validate_days_of_week(&days_of_week)?;
        if frequency.uses_days_of_week() && days_of_week.is_empty() {
            return Err(CoreError::Validation(format!(
                "days_of_week must not be empty for {frequency} patterns"
            )));
        }
        if let Some(end) = end_date {
            if end < start_date {
                return Err(CoreError::Validation(format!(
                    "end_date {end} is before start_date {start_date}"
                )));
            }
        }
        Ok(Self {
            frequency,
            interval,
            days_of_week,
            time_of_day,
            start_date,
            end_date,
        })
    }

    /// Whether the series produces an occurrence on `date`.
    ///
    /// Dates before `start_date` or after the inclusive `end_date` never
    /// match.
    pub fn matches(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }

        if self.frequency.uses_days_of_week() {
            let weekday = date.weekday().num_days_from_sunday() as i16;
            if !self.days_of_week.contains(&weekday) {
                return false;
            }
        }

        let interval = i64::from(self.interval);
        let elapsed_days = (date - self.start_date).num_days();

        match self.frequency {
            Frequency::Daily => elapsed_days % interval == 0,
            Frequency::Weekly => (elapsed_days / 7) % interval == 0,
            // Every other week: week index divisible by 2*interval. A plain
            // floor(days/14) test would match every day of the first week of
            // each 14-day block, which defeats the alternating cadence.
            Frequency::Biweekly => (elapsed_days / 7) % (2 * interval) == 0,
            Frequency::Monthly => {
                self.day_pinned(date) && elapsed_months(self.start_date, date) % interval == 0
            }
            Frequency::Quarterly => {
                self.day_pinned(date)
                    && elapsed_months(self.start_date, date) % (3 * interval) == 0
            }
            Frequency::Yearly => {
                self.day_pinned(date)
                    && date.month() == self.start_date.month()
                    && i64::from(date.year() - self.start_date.year()) % interval == 0
            }
        }
    }

    /// Enumerate occurrence date-times inside `[window_start, window_end]`
    /// (both inclusive), clamped to the rule's own date bounds.
    ///
    /// Walks day-by-day, so the work is bounded by the window length and
    /// independent of how much data exists.
    pub fn occurrences(
        &self,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Vec<NaiveDateTime> {
        let from = window_start.max(self.start_date);
        let to = match self.end_date {
            Some(end) => window_end.min(end),
            None => window_end,
        };

        from.iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| self.matches(*d))
            .map(|d| d.and_time(self.time_of_day))
            .collect()
    }

    fn day_pinned(&self, date: NaiveDate) -> bool {
        date.day() == self.start_date.day()
    }
}

/// Whole calendar months between two dates, ignoring the day component.
fn elapsed_months(start: NaiveDate, date: NaiveDate) -> i64 {
    i64::from(date.year() - start.year()) * 12
        + (i64::from(date.month()) - i64::from(start.month()))
}
