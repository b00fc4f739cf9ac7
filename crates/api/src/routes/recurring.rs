//! Route definitions for the `/recurring-appointments` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::recurring;
use crate::state::AppState;

/// Routes mounted at `/recurring-appointments`.
///
/// ```text
/// POST   /                -> create
/// GET    /                -> list
/// GET    /{id}            -> get
/// PUT    /{id}            -> update
/// DELETE /{id}            -> cancel
/// POST   /{id}/generate   -> generate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(recurring::create).get(recurring::list))
        .route(
            "/{id}",
            get(recurring::get)
                .put(recurring::update)
                .delete(recurring::cancel),
        )
        .route("/{id}/generate", post(recurring::generate))
}
