pub mod health;
pub mod recurring;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /recurring-appointments              create, list
/// /recurring-appointments/{id}         get, update, cancel
/// /recurring-appointments/{id}/generate manual generation pass
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/recurring-appointments", recurring::router())
}
