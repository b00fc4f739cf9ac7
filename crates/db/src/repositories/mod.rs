mod appointment_repo;
mod recurring_repo;
mod relation_repo;

pub use appointment_repo::AppointmentRepo;
pub use recurring_repo::RecurringRepo;
pub use relation_repo::DentistPatientRepo;
