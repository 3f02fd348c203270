#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

pub use repo::{PatientStore, PgPatientStore, StoreError};
pub use repo_types::Patient;
