mod admin;
mod extract;
mod middleware;

use std::collections::HashMap;
use std::sync::LazyLock;

use axum::Json;
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use axum::middleware as mw;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use self::extract::{AppJson, AppPath, AppQuery};
use crate::db::repository;
use crate::error::AppError;
use crate::grading::{self, GradeEntry, OverallCgpa, SemesterTotals, SubjectStatus};
use crate::models::*;
use crate::pagination::{Page, PageRequest};
use crate::services::{IssuedToken, OtpService};
use crate::state::AppState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("valid email pattern"));

#[derive(Deserialize)]
struct SendOtpRequest {
    email: Option<String>,
}

#[derive(Deserialize)]
struct VerifyOtpRequest {
    email: Option<String>,
    otp: Option<String>,
}

#[derive(Deserialize)]
struct GradeEntryRequest {
    subject_code: String,
    status: SubjectStatus,
    #[serde(default)]
    grade: Option<String>,
}

#[derive(Deserialize)]
struct CalculateSemesterRequest {
    semester: i64,
    department_code: String,
    entries: Vec<GradeEntryRequest>,
}

#[derive(Serialize)]
struct SaveResultResponse {
    message: &'static str,
    result: SemesterResult,
}

#[derive(Deserialize)]
struct HistoryParams {
    email: Option<String>,
    dept_id: Option<i64>,
    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Deserialize)]
struct CgpaParams {
    email: Option<String>,
    dept_id: Option<i64>,
}

#[derive(Deserialize)]
struct DeleteResultParams {
    email: Option<String>,
    semester: Option<i64>,
    department: Option<i64>,
}

#[derive(Deserialize)]
struct TokenRequest {
    username: String,
    password: String,
}

pub fn router(state: AppState) -> Router {
    let admin_router = Router::new()
        .route("/admin-results", get(admin::admin_results))
        .route("/admin/departments", post(admin::create_department))
        .route("/admin/semesters", post(admin::create_semester))
        .route("/admin/subjects", post(admin::create_subject))
        .route_layer(mw::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/departments", get(list_departments))
        .route("/send-otp", post(send_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/subjects/{semester}/{dept_code}", get(subjects_by_semester_and_department))
        .route("/semesters", get(list_semesters))
        .route("/calculate-semester", post(calculate_semester))
        .route("/save-result", post(save_result))
        .route("/user-history", get(user_history))
        .route("/calculate-cgpa", get(calculate_cgpa))
        .route("/delete-result", delete(delete_result))
        .route("/token", post(issue_token))
        .merge(admin_router)
        .with_state(state)
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

fn require_email(value: Option<String>) -> Result<String, AppError> {
    let email = require(value, "email")?.trim().to_string();
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::Validation(format!("invalid email: {}", email)));
    }
    Ok(email)
}

async fn require_department(state: &AppState, id: i64) -> Result<Department, AppError> {
    repository::find_department_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_departments(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let departments = repository::fetch_departments(&state.db).await?;
    Ok(Json(json!({ "departments": departments })))
}

async fn send_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<SendOtpRequest>,
) -> Result<Json<Value>, AppError> {
    let email = require_email(req.email)?;
    let service = OtpService::new(state.db.clone(), state.mailer.clone());
    let issue = service.issue(&email).await?;
    Ok(Json(json!({ "message": "OTP sent", "delivered": issue.delivered })))
}

async fn verify_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<VerifyOtpRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(email), Some(otp)) = (req.email, req.otp) else {
        return Err(AppError::Validation("Email and OTP are required".to_string()));
    };
    let service = OtpService::new(state.db.clone(), state.mailer.clone());
    service.verify(email.trim(), otp.trim()).await?.into_result()?;
    Ok(Json(json!({ "verified": true })))
}

async fn subjects_by_semester_and_department(
    State(state): State<AppState>,
    AppPath((semester, dept_code)): AppPath<(i64, String)>,
) -> Result<Json<Value>, AppError> {
    let subjects = fetch_subjects_for(&state, semester, &dept_code).await?;
    Ok(Json(json!({ "subjects": subjects })))
}

async fn fetch_subjects_for(
    state: &AppState,
    semester: i64,
    dept_code: &str,
) -> Result<Vec<Subject>, AppError> {
    let semester = repository::find_semester_by_number(&state.db, semester)
        .await?
        .ok_or_else(|| AppError::NotFound("Semester not found".to_string()))?;
    let department = repository::find_department_by_code(&state.db, dept_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;
    Ok(repository::fetch_subjects(&state.db, semester.id, department.id).await?)
}

async fn list_semesters(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let semesters = repository::fetch_semester_numbers(&state.db).await?;
    Ok(Json(json!({ "semesters": semesters })))
}

async fn calculate_semester(
    State(state): State<AppState>,
    AppJson(req): AppJson<CalculateSemesterRequest>,
) -> Result<Json<SemesterTotals>, AppError> {
    let credits: HashMap<String, f64> =
        fetch_subjects_for(&state, req.semester, &req.department_code)
            .await?
            .into_iter()
            .map(|s| (s.code, s.credit))
            .collect();

    let entries = req
        .entries
        .into_iter()
        .map(|e| -> Result<GradeEntry, AppError> {
            let credit = *credits.get(&e.subject_code).ok_or_else(|| {
                AppError::NotFound(format!("Subject {} not found", e.subject_code))
            })?;
            Ok(GradeEntry {
                subject_code: e.subject_code,
                credit,
                status: e.status,
                grade: e.grade,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(grading::calculate_semester(&entries)?))
}

async fn save_result(
    State(state): State<AppState>,
    AppJson(req): AppJson<SaveResultRequest>,
) -> Result<(StatusCode, Json<SaveResultResponse>), AppError> {
    let email = require_email(req.email)?;
    let semester = require(req.semester, "semester")?;
    let department_id = require(req.department, "department")?;
    if semester <= 0 {
        return Err(AppError::Validation("semester must be positive".to_string()));
    }
    if req.total_credits < 0.0 || req.total_grade_points < 0.0 {
        return Err(AppError::Validation("totals must not be negative".to_string()));
    }
    let derived = (req.total_credits > 0.0)
        .then(|| grading::round2(req.total_grade_points / req.total_credits));
    let cgpa = match (req.cgpa, derived) {
        (Some(cgpa), Some(expected)) if (cgpa - expected).abs() > 0.005 => {
            return Err(AppError::Validation(format!(
                "cgpa {} does not match totals (expected {})",
                cgpa, expected
            )));
        }
        (Some(cgpa), _) => cgpa,
        (None, Some(expected)) => expected,
        (None, None) => return Err(AppError::Validation("cgpa is required".to_string())),
    };
    if !(0.0..=10.0).contains(&cgpa) {
        return Err(AppError::Validation("cgpa must be between 0 and 10".to_string()));
    }
    require_department(&state, department_id).await?;

    let result = state
        .results
        .upsert(NewSemesterResult {
            key: ResultKey {
                email,
                semester,
                department_id,
            },
            cgpa,
            total_credits: req.total_credits,
            total_grade_points: req.total_grade_points,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveResultResponse {
            message: "Result saved successfully",
            result,
        }),
    ))
}

async fn user_history(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<HistoryParams>,
) -> Result<Json<Page<SemesterResult>>, AppError> {
    let email = require_email(params.email)?;
    let department_id = require(params.dept_id, "dept_id")?;
    let page = PageRequest::new(params.page, params.page_size)?;
    let history = state.results.list_history(&email, department_id, page).await?;
    Ok(Json(history))
}

async fn calculate_cgpa(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<CgpaParams>,
) -> Result<Json<OverallCgpa>, AppError> {
    let email = require_email(params.email)?;
    let department_id = require(params.dept_id, "dept_id")?;
    let results = state.results.totals_for(&email, department_id).await?;
    Ok(Json(grading::aggregate(&results)?))
}

async fn delete_result(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<DeleteResultParams>,
) -> Result<StatusCode, AppError> {
    let key = ResultKey {
        email: require_email(params.email)?,
        semester: require(params.semester, "semester")?,
        department_id: require(params.department, "department")?,
    };
    state.results.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn issue_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<TokenRequest>,
) -> Result<Json<IssuedToken>, AppError> {
    let token = state.auth.issue_token(&req.username, &req.password).await?;
    Ok(Json(token))
}
