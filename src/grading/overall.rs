use serde::Serialize;

use super::{GradingError, round2};
use crate::models::SemesterResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallCgpa {
    pub cgpa: f64,
    pub semester_count: usize,
    pub total_credits: f64,
    pub total_grade_points: f64,
}

/// Cumulative CGPA over every stored semester of one student in one department.
pub fn aggregate(results: &[SemesterResult]) -> Result<OverallCgpa, GradingError> {
    let (credits, points) = results.iter().fold((0.0, 0.0), |(c, p), r| {
        (c + r.total_credits, p + r.total_grade_points)
    });

    if credits <= 0.0 {
        return Err(GradingError::NoCredits);
    }

    Ok(OverallCgpa {
        cgpa: round2(points / credits),
        semester_count: results.len(),
        total_credits: credits,
        total_grade_points: points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(semester: i64, credits: f64, points: f64) -> SemesterResult {
        SemesterResult {
            id: semester,
            email: "student@example.com".to_string(),
            semester,
            department_id: 1,
            cgpa: round2(points / credits),
            total_credits: credits,
            total_grade_points: points,
            created_at: "2025-06-23T10:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_two_semesters() {
        let overall = aggregate(&[stored(1, 7.0, 58.0), stored(2, 6.0, 48.0)]).unwrap();
        assert_eq!(overall.cgpa, 8.15);
        assert_eq!(overall.semester_count, 2);
        assert_eq!(overall.total_credits, 13.0);
        assert_eq!(overall.total_grade_points, 106.0);
    }

    #[test]
    fn test_no_records_has_no_credits() {
        assert_eq!(aggregate(&[]), Err(GradingError::NoCredits));
    }

    #[test]
    fn test_zero_credit_records_have_no_credits() {
        let mut empty = stored(1, 1.0, 0.0);
        empty.total_credits = 0.0;
        assert_eq!(aggregate(&[empty]), Err(GradingError::NoCredits));
    }
}
