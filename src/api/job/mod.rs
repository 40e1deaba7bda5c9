pub mod models;
pub mod dto;
pub mod export;
pub mod handlers;
pub mod query;
pub mod service;
pub mod stats;

// Re-export commonly used types
pub use models::{ApplicationStatus, JobApplication, JobUpdate, NewJob, SalaryInput};
pub use query::QueryOutcome;
pub use service::{JobService, ServiceError};
