//! Domain error taxonomy shared by every layer.
//!
//! Repositories and the recurrence engine return `CoreError`; the API layer
//! maps each variant onto an HTTP status (NotFound -> 404, Validation ->
//! 400, Conflict -> 409, Unauthorized -> 401, Forbidden -> 403,
//! Internal -> 500).

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No row for `id` inside the caller's (dentist, tenant) scope. An id
    /// that exists but belongs to another dentist or tenant reads exactly
    /// the same, so existence never leaks across scopes.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A schedule shape or request field failed a boundary check: unknown
    /// frequency name, interval below 1, weekday index outside 0..=6, an
    /// empty weekday set on a weekday-driven frequency, unparseable
    /// `HH:MM` time, or an end date before the start date. Raised before
    /// anything is persisted.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A uniqueness contract was violated, e.g. a second appointment row
    /// for the same (pattern, timestamp) arriving through a write path
    /// that does not go through the conflict-free generation insert.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request carried no valid identity (missing or bad token).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is known but not allowed: typically a dentist creating a
    /// pattern for a patient they have no active treatment relationship
    /// with.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invariant breakage that callers cannot act on, such as a stored
    /// pattern whose columns no longer rebuild into a valid rule.
    #[error("Internal error: {0}")]
    Internal(String),
}
