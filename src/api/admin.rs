use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::info;

use super::extract::{AppJson, AppQuery};
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::pagination::{ADMIN_PAGE_SIZE, Page, PageRequest};
use crate::state::AppState;

#[derive(Deserialize)]
pub(super) struct AdminResultsParams {
    page: Option<u32>,
}

pub(super) async fn admin_results(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AdminResultsParams>,
) -> Result<Json<Page<SemesterResult>>, AppError> {
    let page = PageRequest::fixed(params.page, ADMIN_PAGE_SIZE)?;
    Ok(Json(state.results.list_all(page).await?))
}

pub(super) async fn create_department(
    State(state): State<AppState>,
    AppJson(mut req): AppJson<NewDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    req.name = req.name.trim().to_string();
    req.code = req.code.trim().to_string();
    if req.name.is_empty() || req.code.is_empty() {
        return Err(AppError::Validation("name and code are required".to_string()));
    }
    if req.code.len() > 10 {
        return Err(AppError::Validation("code must be at most 10 characters".to_string()));
    }

    let department = repository::insert_department(&state.db, req).await?;
    info!("Created department {} ({})", department.code, department.id);
    Ok((StatusCode::CREATED, Json(department)))
}

pub(super) async fn create_semester(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewSemesterRequest>,
) -> Result<(StatusCode, Json<Semester>), AppError> {
    if req.number <= 0 {
        return Err(AppError::Validation("number must be positive".to_string()));
    }

    let semester = repository::insert_semester(&state.db, req).await?;
    info!("Created semester {}", semester.number);
    Ok((StatusCode::CREATED, Json(semester)))
}

pub(super) async fn create_subject(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewSubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let code = req.code.trim();
    let name = req.name.trim();
    if code.is_empty() || name.is_empty() {
        return Err(AppError::Validation("code and name are required".to_string()));
    }
    if !(req.credit > 0.0) {
        return Err(AppError::Validation("credit must be positive".to_string()));
    }

    let semester = repository::find_semester_by_number(&state.db, req.semester)
        .await?
        .ok_or_else(|| AppError::NotFound("Semester not found".to_string()))?;
    let department = repository::find_department_by_code(&state.db, req.department_code.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    let subject =
        repository::insert_subject(&state.db, code, name, req.credit, semester.id, department.id)
            .await?;
    info!(
        "Created subject {} for semester {} in {}",
        subject.code, semester.number, department.code
    );
    Ok((StatusCode::CREATED, Json(subject)))
}
