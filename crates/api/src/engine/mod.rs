//! The recurrence engine: turns recurring appointment templates into
//! concrete appointment rows and keeps them consistent across edits.

pub mod recurrence;
