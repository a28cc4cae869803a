use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{format_timestamp, parse_timestamp, repository};
use crate::error::AppError;

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: String,
}

/// Bearer tokens for the admin surface. Only token digests are stored.
#[derive(Clone)]
pub struct AdminAuth {
    db: SqlitePool,
    username: String,
    password_sha256: String,
    ttl: Duration,
}

impl AdminAuth {
    pub fn new(db: SqlitePool, config: &AppConfig) -> Self {
        Self {
            db,
            username: config.admin_username.clone(),
            password_sha256: config.admin_password_sha256.clone(),
            ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    pub async fn issue_token(&self, username: &str, password: &str) -> Result<IssuedToken, AppError> {
        self.issue_token_at(username, password, Utc::now()).await
    }

    pub async fn issue_token_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        if username != self.username || sha256_hex(password) != self.password_sha256 {
            warn!("Rejected admin login for {}", username);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let purged = repository::delete_expired_admin_tokens(&self.db, &format_timestamp(now)).await?;
        if purged > 0 {
            info!("Purged {} expired admin tokens", purged);
        }

        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let expires_at = format_timestamp(now + self.ttl);
        repository::insert_admin_token(
            &self.db,
            &sha256_hex(&token),
            &format_timestamp(now),
            &expires_at,
        )
        .await?;

        info!("Issued admin token for {} (expires {})", username, expires_at);
        Ok(IssuedToken {
            access_token: token,
            token_type: "Bearer",
            expires_at,
        })
    }

    pub async fn validate(&self, token: &str) -> Result<(), AppError> {
        self.validate_at(token, Utc::now()).await
    }

    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let expires_at = repository::find_admin_token_expiry(&self.db, &sha256_hex(token))
            .await?
            .ok_or_else(|| AppError::Forbidden("Invalid token".to_string()))?;

        match parse_timestamp(&expires_at) {
            Some(expiry) if now <= expiry => Ok(()),
            _ => Err(AppError::Forbidden("Token expired".to_string())),
        }
    }
}
