//! CGPA arithmetic: the grade point table, the per-semester calculator and
//! the cumulative aggregator over stored semester results.

pub mod grade;
pub mod overall;
pub mod semester;

use thiserror::Error;

pub use grade::{Grade, grade_point};
pub use overall::{OverallCgpa, aggregate};
pub use semester::{GradeEntry, SemesterTotals, SubjectStatus, calculate_semester};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    #[error("invalid grade: {0}")]
    InvalidGrade(String),

    #[error("no credits to average")]
    NoCredits,

    #[error("duplicate subject: {0}")]
    DuplicateSubject(String),
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
