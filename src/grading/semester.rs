use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{GradingError, grade_point, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectStatus {
    Pass,
    Arrear,
}

/// One subject's outcome as entered by the student. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeEntry {
    pub subject_code: String,
    pub credit: f64,
    pub status: SubjectStatus,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemesterTotals {
    pub cgpa: f64,
    pub total_credits: f64,
    pub total_grade_points: f64,
    pub counted_subjects: usize,
}

/// Weighted grade-point average over the passed subjects of one semester.
///
/// Arrears and passes without a grade are skipped entirely. A grade label
/// outside the table still counts its credit but adds no points. Each
/// subject code may appear at most once.
pub fn calculate_semester(entries: &[GradeEntry]) -> Result<SemesterTotals, GradingError> {
    let mut seen = HashSet::new();
    if let Some(dup) = entries.iter().find(|e| !seen.insert(e.subject_code.as_str())) {
        return Err(GradingError::DuplicateSubject(dup.subject_code.clone()));
    }

    let mut total_credits = 0.0;
    let mut total_points = 0.0;
    let mut counted = 0;

    for entry in entries {
        if entry.status != SubjectStatus::Pass {
            continue;
        }
        let Some(label) = entry.grade.as_deref() else {
            continue;
        };

        let points = match grade_point(label) {
            Ok(points) => f64::from(points),
            Err(e) => {
                warn!("{} for subject {}, counted as 0 points", e, entry.subject_code);
                0.0
            }
        };

        total_credits += entry.credit;
        total_points += entry.credit * points;
        counted += 1;
    }

    if total_credits <= 0.0 {
        return Err(GradingError::NoCredits);
    }

    Ok(SemesterTotals {
        cgpa: round2(total_points / total_credits),
        total_credits,
        total_grade_points: total_points,
        counted_subjects: counted,
    })
}
