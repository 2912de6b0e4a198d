pub mod applicant;
pub mod queue;
pub mod slot;
