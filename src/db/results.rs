use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::format_timestamp;
use crate::error::AppError;
use crate::models::{NewSemesterResult, ResultKey, SemesterResult};
use crate::pagination::{Page, PageRequest};

const RESULT_COLUMNS: &str =
    "id, email, semester, department_id, cgpa, total_credits, total_grade_points, created_at";

/// Persistence of per-semester results keyed by (email, semester, department).
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Replaces whatever is stored under the key with `result`.
    async fn upsert(&self, result: NewSemesterResult) -> Result<SemesterResult, AppError>;

    /// One student's results in one department, newest first.
    async fn list_history(
        &self,
        email: &str,
        department_id: i64,
        page: PageRequest,
    ) -> Result<Page<SemesterResult>, AppError>;

    async fn delete(&self, key: &ResultKey) -> Result<(), AppError>;

    /// Every stored result, newest first.
    async fn list_all(&self, page: PageRequest) -> Result<Page<SemesterResult>, AppError>;

    async fn totals_for(
        &self,
        email: &str,
        department_id: i64,
    ) -> Result<Vec<SemesterResult>, AppError>;
}

#[derive(Clone)]
pub struct SqliteResultStore {
    db: SqlitePool,
}

impl SqliteResultStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn upsert(&self, result: NewSemesterResult) -> Result<SemesterResult, AppError> {
        let now = format_timestamp(Utc::now());
        let key = &result.key;

        let mut tx = self.db.begin().await?;

        let replaced = sqlx::query(
            "DELETE FROM user_results WHERE email = ? AND semester = ? AND department_id = ?"
        )
        .bind(&key.email)
        .bind(key.semester)
        .bind(key.department_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let id = sqlx::query(
            "INSERT INTO user_results (email, semester, department_id, cgpa, total_credits, total_grade_points, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&key.email)
        .bind(key.semester)
        .bind(key.department_id)
        .bind(result.cgpa)
        .bind(result.total_credits)
        .bind(result.total_grade_points)
        .bind(&now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        if replaced > 0 {
            info!(
                "Replaced result for {} semester {} department {}",
                key.email, key.semester, key.department_id
            );
        }

        Ok(SemesterResult {
            id,
            email: result.key.email,
            semester: result.key.semester,
            department_id: result.key.department_id,
            cgpa: result.cgpa,
            total_credits: result.total_credits,
            total_grade_points: result.total_grade_points,
            created_at: now,
        })
    }

    async fn list_history(
        &self,
        email: &str,
        department_id: i64,
        page: PageRequest,
    ) -> Result<Page<SemesterResult>, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_results WHERE email = ? AND department_id = ?"
        )
        .bind(email)
        .bind(department_id)
        .fetch_one(&self.db)
        .await?;
        page.check_against(count)?;

        let sql = format!(
            "SELECT {} FROM user_results WHERE email = ? AND department_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            RESULT_COLUMNS
        );
        let results = sqlx::query_as::<_, SemesterResult>(&sql)
            .bind(email)
            .bind(department_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(Page::new(page, count, results))
    }

    async fn delete(&self, key: &ResultKey) -> Result<(), AppError> {
        let affected = sqlx::query(
            "DELETE FROM user_results WHERE email = ? AND semester = ? AND department_id = ?"
        )
        .bind(&key.email)
        .bind(key.semester)
        .bind(key.department_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound("Result not found".to_string()));
        }
        Ok(())
    }

    async fn list_all(&self, page: PageRequest) -> Result<Page<SemesterResult>, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_results")
            .fetch_one(&self.db)
            .await?;
        page.check_against(count)?;

        let sql = format!(
            "SELECT {} FROM user_results ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            RESULT_COLUMNS
        );
        let results = sqlx::query_as::<_, SemesterResult>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(Page::new(page, count, results))
    }

    async fn totals_for(
        &self,
        email: &str,
        department_id: i64,
    ) -> Result<Vec<SemesterResult>, AppError> {
        let sql = format!(
            "SELECT {} FROM user_results WHERE email = ? AND department_id = ? ORDER BY semester",
            RESULT_COLUMNS
        );
        let results = sqlx::query_as::<_, SemesterResult>(&sql)
            .bind(email)
            .bind(department_id)
            .fetch_all(&self.db)
            .await?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect_in_memory, repository};
    use crate::models::NewDepartmentRequest;

    async fn setup_test_store() -> (SqliteResultStore, i64, i64) {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let cse = repository::insert_department(
            &pool,
            NewDepartmentRequest {
                name: "Computer Science".to_string(),
                code: "CSE".to_string(),
            },
        )
        .await
        .expect("Failed to insert department");
        let ece = repository::insert_department(
            &pool,
            NewDepartmentRequest {
                name: "Electronics".to_string(),
                code: "ECE".to_string(),
            },
        )
        .await
        .expect("Failed to insert department");
        (SqliteResultStore::new(pool), cse.id, ece.id)
    }

    fn new_result(email: &str, semester: i64, department_id: i64, credits: f64, points: f64) -> NewSemesterResult {
        NewSemesterResult {
            key: ResultKey {
                email: email.to_string(),
                semester,
                department_id,
            },
            cgpa: crate::grading::round2(points / credits),
            total_credits: credits,
            total_grade_points: points,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_key() {
        let (store, cse, _) = setup_test_store().await;

        store.upsert(new_result("s@example.com", 1, cse, 7.0, 58.0)).await.unwrap();
        let second = store.upsert(new_result("s@example.com", 1, cse, 6.0, 48.0)).await.unwrap();

        let all = store.totals_for("s@example.com", cse).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[0].total_credits, 6.0);
        assert_eq!(all[0].total_grade_points, 48.0);
        assert_eq!(all[0].cgpa, 8.0);
    }

    #[tokio::test]
    async fn test_upsert_keys_are_department_scoped() {
        let (store, cse, ece) = setup_test_store().await;

        store.upsert(new_result("s@example.com", 1, cse, 7.0, 58.0)).await.unwrap();
        store.upsert(new_result("s@example.com", 1, ece, 6.0, 48.0)).await.unwrap();

        assert_eq!(store.totals_for("s@example.com", cse).await.unwrap().len(), 1);
        assert_eq!(store.totals_for("s@example.com", ece).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_not_found() {
        let (store, cse, _) = setup_test_store().await;
        let key = ResultKey {
            email: "nobody@example.com".to_string(),
            semester: 4,
            department_id: cse,
        };

        let err = store.delete(&key).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_existing_key() {
        let (store, cse, _) = setup_test_store().await;
        let saved = store.upsert(new_result("s@example.com", 2, cse, 7.0, 58.0)).await.unwrap();
        let key = ResultKey {
            email: saved.email.clone(),
            semester: saved.semester,
            department_id: saved.department_id,
        };

        store.delete(&key).await.unwrap();
        assert!(store.totals_for("s@example.com", cse).await.unwrap().is_empty());
        assert!(matches!(store.delete(&key).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_is_paginated_newest_first() {
        let (store, cse, ece) = setup_test_store().await;
        for semester in 1..=3 {
            store
                .upsert(new_result("s@example.com", semester, cse, 5.0, 40.0))
                .await
                .unwrap();
        }
        store.upsert(new_result("s@example.com", 1, ece, 5.0, 40.0)).await.unwrap();
        store.upsert(new_result("t@example.com", 1, cse, 5.0, 40.0)).await.unwrap();

        let first = store
            .list_history("s@example.com", cse, PageRequest::new(Some(1), Some(2)).unwrap())
            .await
            .unwrap();
        assert_eq!(first.count, 3);
        assert_eq!(first.total_pages, 2);
        let semesters: Vec<i64> = first.results.iter().map(|r| r.semester).collect();
        assert_eq!(semesters, vec![3, 2]);
        assert_eq!(first.next, Some(2));

        let second = store
            .list_history("s@example.com", cse, PageRequest::new(Some(2), Some(2)).unwrap())
            .await
            .unwrap();
        assert_eq!(second.results.len(), 1);
        assert_eq!(second.results[0].semester, 1);

        let beyond = store
            .list_history("s@example.com", cse, PageRequest::new(Some(3), Some(2)).unwrap())
            .await;
        assert!(matches!(beyond, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first() {
        let (store, cse, _) = setup_test_store().await;
        for (i, email) in ["a@example.com", "b@example.com", "c@example.com"].iter().enumerate() {
            store
                .upsert(new_result(email, i as i64 + 1, cse, 5.0, 40.0))
                .await
                .unwrap();
        }

        let page = store
            .list_all(PageRequest::fixed(Some(1), 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        let emails: Vec<&str> = page.results.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, vec!["c@example.com", "b@example.com"]);
    }
}
