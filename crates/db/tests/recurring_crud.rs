//! Integration tests for the recurring appointment repositories.
//!
//! Exercises the repository layer against a real database:
//! - Template CRUD and (dentist, tenant) scoping
//! - The generated-appointment unique index (idempotent inserts)
//! - Future-scheduled delete/cancel selectivity

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use dentora_core::recurrence::Frequency;
use dentora_db::models::appointment::{AppointmentStatus, NewGeneratedAppointment};
use dentora_db::models::recurring::{CreateRecurringAppointment, UpdateRecurringFields};
use dentora_db::repositories::{AppointmentRepo, DentistPatientRepo, RecurringRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Clinic {
    tenant_id: i64,
    dentist_id: i64,
    patient_id: i64,
}

async fn seed_clinic(pool: &PgPool) -> Clinic {
    let (tenant_id,): (i64,) =
        sqlx::query_as("INSERT INTO tenants (name) VALUES ('Smile Dental') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let (dentist_id,): (i64,) = sqlx::query_as(
        "INSERT INTO dentists (tenant_id, display_name) VALUES ($1, 'Dr. Ada') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let (patient_id,): (i64,) = sqlx::query_as(
        "INSERT INTO patients (tenant_id, display_name) VALUES ($1, 'Pat Doe') RETURNING id",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
    .unwrap();
    DentistPatientRepo::link(pool, patient_id, dentist_id, tenant_id)
        .await
        .unwrap();
    Clinic {
        tenant_id,
        dentist_id,
        patient_id,
    }
}

fn weekly_template(clinic: &Clinic) -> CreateRecurringAppointment {
    CreateRecurringAppointment {
        tenant_id: clinic.tenant_id,
        dentist_id: clinic.dentist_id,
        patient_id: clinic.patient_id,
        operatory_id: None,
        frequency: Frequency::Weekly,
        repeat_interval: 1,
        days_of_week: vec![1, 3, 5],
        time_of_day: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        duration_minutes: 30,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        end_date: None,
        procedure_type: "cleaning".to_string(),
        notes: None,
    }
}

fn occurrence(clinic: &Clinic, recurring_id: i64, days_from_now: i64) -> NewGeneratedAppointment {
    NewGeneratedAppointment {
        tenant_id: clinic.tenant_id,
        dentist_id: clinic.dentist_id,
        patient_id: clinic.patient_id,
        operatory_id: None,
        recurring_id,
        appointment_date: Utc::now() + Duration::days(days_from_now),
        duration_minutes: 30,
        procedure_type: "cleaning".to_string(),
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Association checks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn has_active_relation_after_link(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let ok = DentistPatientRepo::has_active_relation(
        &pool,
        clinic.patient_id,
        clinic.dentist_id,
        clinic.tenant_id,
    )
    .await
    .unwrap();
    assert!(ok);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn no_relation_for_unlinked_patient(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let (other_patient,): (i64,) = sqlx::query_as(
        "INSERT INTO patients (tenant_id, display_name) VALUES ($1, 'Stranger') RETURNING id",
    )
    .bind(clinic.tenant_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let ok = DentistPatientRepo::has_active_relation(
        &pool,
        other_patient,
        clinic.dentist_id,
        clinic.tenant_id,
    )
    .await
    .unwrap();
    assert!(!ok);
}

// ---------------------------------------------------------------------------
// Template CRUD and scoping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_and_find_scoped(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let created = RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    assert!(created.is_active);
    assert_eq!(created.frequency, "WEEKLY");
    assert_eq!(created.repeat_interval, 1);
    assert_eq!(created.days_of_week, vec![1, 3, 5]);

    let found = RecurringRepo::find_scoped(&pool, created.id, clinic.dentist_id, clinic.tenant_id)
        .await
        .unwrap();
    assert!(found.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_scoped_hides_other_dentists_patterns(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let created = RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    let (other_dentist,): (i64,) = sqlx::query_as(
        "INSERT INTO dentists (tenant_id, display_name) VALUES ($1, 'Dr. Bob') RETURNING id",
    )
    .bind(clinic.tenant_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let found = RecurringRepo::find_scoped(&pool, created.id, other_dentist, clinic.tenant_id)
        .await
        .unwrap();
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_scoped_filters_by_patient(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    let all = RecurringRepo::list_scoped(&pool, clinic.dentist_id, clinic.tenant_id, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    let filtered = RecurringRepo::list_scoped(
        &pool,
        clinic.dentist_id,
        clinic.tenant_id,
        Some(clinic.patient_id),
    )
    .await
    .unwrap();
    assert_eq!(filtered.len(), 1);

    let none = RecurringRepo::list_scoped(
        &pool,
        clinic.dentist_id,
        clinic.tenant_id,
        Some(clinic.patient_id + 999),
    )
    .await
    .unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_fields_is_partial(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let created = RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    let changes = UpdateRecurringFields {
        notes: Some(Some("bring x-rays".to_string())),
        ..Default::default()
    };
    let updated = RecurringRepo::update_fields(&pool, created.id, &changes)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.notes.as_deref(), Some("bring x-rays"));
    // Untouched fields survive.
    assert_eq!(updated.frequency, "WEEKLY");
    assert_eq!(updated.days_of_week, created.days_of_week);
    assert!(!changes.changes_schedule());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_fields_clears_nullable_columns(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let mut template = weekly_template(&clinic);
    template.end_date = Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    template.notes = Some("initial".to_string());
    let created = RecurringRepo::create(&pool, &template).await.unwrap();
    assert!(created.end_date.is_some());

    // Present-but-None clears the column; restores the series to open-ended.
    let changes = UpdateRecurringFields {
        end_date: Some(None),
        notes: Some(None),
        ..Default::default()
    };
    assert!(changes.changes_schedule());
    let updated = RecurringRepo::update_fields(&pool, created.id, &changes)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.end_date, None);
    assert_eq!(updated.notes, None);

    // Absent fields leave existing values alone even when NULL-able.
    let noop = RecurringRepo::update_fields(&pool, created.id, &UpdateRecurringFields::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(noop.end_date, None);
    assert_eq!(noop.frequency, "WEEKLY");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivate_flips_once(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let created = RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    assert!(RecurringRepo::deactivate(&pool, created.id).await.unwrap());
    // Second call is a no-op.
    assert!(!RecurringRepo::deactivate(&pool, created.id).await.unwrap());

    let active = RecurringRepo::list_active(&pool).await.unwrap();
    assert!(active.iter().all(|p| p.id != created.id));
}

// ---------------------------------------------------------------------------
// Generated appointments: unique index and bulk updates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn insert_generated_is_idempotent(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let pattern = RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    let occ = occurrence(&clinic, pattern.id, 7);
    let first = AppointmentRepo::insert_generated(&pool, &occ).await.unwrap();
    assert!(first.is_some());
    assert_eq!(first.unwrap().status, AppointmentStatus::Scheduled);

    // Same (recurring_id, appointment_date): the unique index makes this a
    // benign no-op.
    let second = AppointmentRepo::insert_generated(&pool, &occ).await.unwrap();
    assert!(second.is_none());

    let count = AppointmentRepo::count_for_pattern(&pool, pattern.id)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_future_scheduled_spares_past_and_modified(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let pattern = RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    // Two future scheduled, one future completed, one past scheduled.
    let future_a = AppointmentRepo::insert_generated(&pool, &occurrence(&clinic, pattern.id, 7))
        .await
        .unwrap()
        .unwrap();
    AppointmentRepo::insert_generated(&pool, &occurrence(&clinic, pattern.id, 14))
        .await
        .unwrap()
        .unwrap();
    let completed = AppointmentRepo::insert_generated(&pool, &occurrence(&clinic, pattern.id, 21))
        .await
        .unwrap()
        .unwrap();
    AppointmentRepo::set_status(&pool, completed.id, AppointmentStatus::Completed)
        .await
        .unwrap();
    AppointmentRepo::insert_generated(&pool, &occurrence(&clinic, pattern.id, -7))
        .await
        .unwrap()
        .unwrap();

    let deleted = AppointmentRepo::delete_future_scheduled(&pool, pattern.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let remaining = AppointmentRepo::count_for_pattern(&pool, pattern.id)
        .await
        .unwrap();
    assert_eq!(remaining, 2);

    // The deleted ones really are the future scheduled rows.
    let upcoming = AppointmentRepo::list_upcoming_for_pattern(&pool, pattern.id, Utc::now(), 10)
        .await
        .unwrap();
    assert!(upcoming.iter().all(|a| a.id != future_a.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancel_future_scheduled_keeps_rows(pool: PgPool) {
    let clinic = seed_clinic(&pool).await;
    let pattern = RecurringRepo::create(&pool, &weekly_template(&clinic))
        .await
        .unwrap();

    AppointmentRepo::insert_generated(&pool, &occurrence(&clinic, pattern.id, 7))
        .await
        .unwrap()
        .unwrap();
    let past = AppointmentRepo::insert_generated(&pool, &occurrence(&clinic, pattern.id, -7))
        .await
        .unwrap()
        .unwrap();

    let cancelled = AppointmentRepo::cancel_future_scheduled(&pool, pattern.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(cancelled, 1);

    // Nothing deleted: cancellation keeps the calendar record.
    let count = AppointmentRepo::count_for_pattern(&pool, pattern.id)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let upcoming = AppointmentRepo::list_upcoming_for_pattern(&pool, pattern.id, Utc::now(), 10)
        .await
        .unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].status, AppointmentStatus::Cancelled);

    // The past row kept its status.
    let (status,): (AppointmentStatus,) =
        sqlx::query_as("SELECT status FROM appointments WHERE id = $1")
            .bind(past.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, AppointmentStatus::Scheduled);
}
