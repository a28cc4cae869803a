use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db::{ResultStore, SqliteResultStore};
use crate::mailer::Mailer;
use crate::services::AdminAuth;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub results: Arc<dyn ResultStore>,
    pub mailer: Arc<dyn Mailer>,
    pub auth: AdminAuth,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            results: Arc::new(SqliteResultStore::new(db.clone())),
            auth: AdminAuth::new(db.clone(), config),
            mailer,
            db,
        }
    }
}
