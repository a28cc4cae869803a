use sqlx::SqlitePool;

use crate::models::{
    Department, NewDepartmentRequest, NewSemesterRequest, OtpRecord, Semester, Subject,
};

pub async fn fetch_departments(db: &SqlitePool) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments ORDER BY name, id")
        .fetch_all(db)
        .await
}

pub async fn find_department_by_id(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_department_by_code(
    db: &SqlitePool,
    code: &str,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>("SELECT id, name, code FROM departments WHERE code = ?")
        .bind(code)
        .fetch_optional(db)
        .await
}

pub async fn insert_department(
    db: &SqlitePool,
    req: NewDepartmentRequest,
) -> Result<Department, sqlx::Error> {
    let id = sqlx::query("INSERT INTO departments (name, code) VALUES (?, ?)")
        .bind(&req.name)
        .bind(&req.code)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(Department {
        id,
        name: req.name,
        code: req.code,
    })
}

pub async fn fetch_semester_numbers(db: &SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT number FROM semesters ORDER BY number")
        .fetch_all(db)
        .await
}

pub async fn find_semester_by_number(
    db: &SqlitePool,
    number: i64,
) -> Result<Option<Semester>, sqlx::Error> {
    sqlx::query_as::<_, Semester>("SELECT id, number FROM semesters WHERE number = ?")
        .bind(number)
        .fetch_optional(db)
        .await
}

pub async fn insert_semester(
    db: &SqlitePool,
    req: NewSemesterRequest,
) -> Result<Semester, sqlx::Error> {
    let id = sqlx::query("INSERT INTO semesters (number) VALUES (?)")
        .bind(req.number)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(Semester {
        id,
        number: req.number,
    })
}

pub async fn fetch_subjects(
    db: &SqlitePool,
    semester_id: i64,
    department_id: i64,
) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(
        "SELECT id, code, name, credit, semester_id, department_id FROM subjects WHERE semester_id = ? AND department_id = ? ORDER BY id"
    )
    .bind(semester_id)
    .bind(department_id)
    .fetch_all(db)
    .await
}

pub async fn insert_subject(
    db: &SqlitePool,
    code: &str,
    name: &str,
    credit: f64,
    semester_id: i64,
    department_id: i64,
) -> Result<Subject, sqlx::Error> {
    let id = sqlx::query(
        "INSERT INTO subjects (code, name, credit, semester_id, department_id) VALUES (?, ?, ?, ?, ?)"
    )
    .bind(code)
    .bind(name)
    .bind(credit)
    .bind(semester_id)
    .bind(department_id)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(Subject {
        id,
        code: code.to_string(),
        name: name.to_string(),
        credit,
        semester_id,
        department_id,
    })
}

pub async fn insert_otp(
    db: &SqlitePool,
    email: &str,
    otp: &str,
    created_at: &str,
) -> Result<OtpRecord, sqlx::Error> {
    let id = sqlx::query("INSERT INTO email_otps (email, otp, created_at) VALUES (?, ?, ?)")
        .bind(email)
        .bind(otp)
        .bind(created_at)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(OtpRecord {
        id,
        email: email.to_string(),
        otp: otp.to_string(),
        created_at: created_at.to_string(),
    })
}

pub async fn find_latest_otp(
    db: &SqlitePool,
    email: &str,
    otp: &str,
) -> Result<Option<OtpRecord>, sqlx::Error> {
    sqlx::query_as::<_, OtpRecord>(
        "SELECT id, email, otp, created_at FROM email_otps WHERE email = ? AND otp = ? ORDER BY created_at DESC, id DESC LIMIT 1"
    )
    .bind(email)
    .bind(otp)
    .fetch_optional(db)
    .await
}

pub async fn insert_admin_token(
    db: &SqlitePool,
    token_hash: &str,
    created_at: &str,
    expires_at: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO admin_tokens (token_hash, created_at, expires_at) VALUES (?, ?, ?)")
        .bind(token_hash)
        .bind(created_at)
        .bind(expires_at)
        .execute(db)
        .await?;
    Ok(())
}

/// Expiry timestamp of a stored token, if the token exists.
pub async fn find_admin_token_expiry(
    db: &SqlitePool,
    token_hash: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT expires_at FROM admin_tokens WHERE token_hash = ?")
        .bind(token_hash)
        .fetch_optional(db)
        .await
}

pub async fn delete_expired_admin_tokens(db: &SqlitePool, now: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admin_tokens WHERE expires_at < ?")
        .bind(now)
        .execute(db)
        .await?
        .rows_affected();
    Ok(result)
}
