//! Business logic services

mod assignments;

pub use assignments::AssignmentService;
