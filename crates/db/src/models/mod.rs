pub mod appointment;
pub mod recurring;
