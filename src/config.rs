use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://cgpa.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
pub const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;

/// Settings for the HTTP mail relay used to deliver OTP codes.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub relay_url: String,
    pub api_key: String,
    pub from: String,
    /// Upper bound on one relay request, connect included.
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub admin_username: String,
    /// Lowercase hex SHA-256 of the admin password.
    pub admin_password_sha256: String,
    pub token_ttl_minutes: i64,
    pub mail: Option<MailConfig>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password_sha256 = env::var("ADMIN_PASSWORD_SHA256")
            .map_err(|_| AppError::Config("ADMIN_PASSWORD_SHA256 is not set".to_string()))?
            .trim()
            .to_ascii_lowercase();
        if admin_password_sha256.len() != 64
            || !admin_password_sha256.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(AppError::Config(
                "ADMIN_PASSWORD_SHA256 must be a 64 character hex digest".to_string(),
            ));
        }

        let token_ttl_minutes = match env::var("ADMIN_TOKEN_TTL_MINUTES") {
            Ok(raw) => raw.parse::<i64>().ok().filter(|m| *m > 0).ok_or_else(|| {
                AppError::Config("ADMIN_TOKEN_TTL_MINUTES must be a positive integer".to_string())
            })?,
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let mail_timeout_secs = match env::var("MAIL_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                AppError::Config("MAIL_TIMEOUT_SECS must be a positive integer".to_string())
            })?,
            Err(_) => DEFAULT_MAIL_TIMEOUT_SECS,
        };

        let mail = match (env::var("MAIL_RELAY_URL"), env::var("MAIL_API_KEY")) {
            (Ok(relay_url), Ok(api_key)) => Some(MailConfig {
                relay_url,
                api_key,
                from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@cgpa.local".to_string()),
                timeout: Duration::from_secs(mail_timeout_secs),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            admin_username,
            admin_password_sha256,
            token_ttl_minutes,
            mail,
        })
    }
}
