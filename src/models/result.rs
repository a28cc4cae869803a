use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored outcome of one semester for one student in one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SemesterResult {
    pub id: i64,
    pub email: String,
    pub semester: i64,
    pub department_id: i64,
    pub cgpa: f64,
    pub total_credits: f64,
    pub total_grade_points: f64,
    pub created_at: String,
}

/// Identity of a stored result; at most one row exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultKey {
    pub email: String,
    pub semester: i64,
    pub department_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSemesterResult {
    pub key: ResultKey,
    pub cgpa: f64,
    pub total_credits: f64,
    pub total_grade_points: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResultRequest {
    pub email: Option<String>,
    pub semester: Option<i64>,
    pub department: Option<i64>,
    pub cgpa: Option<f64>,
    #[serde(default)]
    pub total_credits: f64,
    #[serde(default)]
    pub total_grade_points: f64,
}
