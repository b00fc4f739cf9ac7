//! Pure domain logic for the dentora backend.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the API server, and any future worker or CLI tooling.

pub mod error;
pub mod recurrence;
pub mod types;
