//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dentora_core::error::CoreError;
use dentora_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated dentist extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Every pattern operation is scoped by this pair; the engine never resolves
/// identity itself.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The dentist's internal database id (from `claims.sub`).
    pub dentist_id: DbId,
    /// The tenant (practice) id (from `claims.tenant`).
    pub tenant_id: DbId,
    /// The user's role name (e.g. `"dentist"`, `"admin"`).
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            dentist_id: claims.sub,
            tenant_id: claims.tenant,
            role: claims.role,
        })
    }
}
