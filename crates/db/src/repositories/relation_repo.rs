//! Repository for the `dentist_patients` association table.

use dentora_core::types::DbId;
use sqlx::PgPool;

/// Lookup of dentist-patient treatment relationships.
pub struct DentistPatientRepo;

impl DentistPatientRepo {
    /// Whether an active association exists between `patient_id` and
    /// `dentist_id` within `tenant_id`.
    ///
    /// Absence is a permission problem, not a not-found: patterns may only
    /// be created for patients the dentist actually treats.
    pub async fn has_active_relation(
        pool: &PgPool,
        patient_id: DbId,
        dentist_id: DbId,
        tenant_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM dentist_patients
                 WHERE patient_id = $1 AND dentist_id = $2 AND tenant_id = $3
                   AND is_active = true
             )",
        )
        .bind(patient_id)
        .bind(dentist_id)
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Create (or reactivate) an association. Used by tenant onboarding and
    /// test fixtures.
    pub async fn link(
        pool: &PgPool,
        patient_id: DbId,
        dentist_id: DbId,
        tenant_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO dentist_patients (tenant_id, dentist_id, patient_id, is_active)
             VALUES ($1, $2, $3, true)
             ON CONFLICT ON CONSTRAINT uq_dentist_patients_pair
             DO UPDATE SET is_active = true
             RETURNING id",
        )
        .bind(tenant_id)
        .bind(dentist_id)
        .bind(patient_id)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }
}
