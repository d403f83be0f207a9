//! Academic evaluation: weekly exams and the final project

pub mod answer;
pub mod exam;
pub mod project;

pub use exam::evaluate_week;
pub use project::evaluate_project;
