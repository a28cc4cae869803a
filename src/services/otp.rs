use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{format_timestamp, parse_timestamp, repository};
use crate::error::AppError;
use crate::mailer::Mailer;
use crate::models::OtpRecord;

pub const OTP_VALIDITY_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpStatus {
    Verified,
    Expired,
    Invalid,
}

impl OtpStatus {
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            OtpStatus::Verified => Ok(()),
            OtpStatus::Expired => Err(AppError::OtpExpired),
            OtpStatus::Invalid => Err(AppError::OtpInvalid),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtpIssue {
    pub record: OtpRecord,
    pub delivered: bool,
}

/// Decides the outcome for the most recent record matching an (email, code) pair.
pub fn classify(record: Option<&OtpRecord>, now: DateTime<Utc>) -> OtpStatus {
    let Some(record) = record else {
        return OtpStatus::Invalid;
    };
    let Some(created_at) = parse_timestamp(&record.created_at) else {
        warn!("OTP record {} has unreadable created_at {}", record.id, record.created_at);
        return OtpStatus::Invalid;
    };

    if now - created_at <= Duration::minutes(OTP_VALIDITY_MINUTES) {
        OtpStatus::Verified
    } else {
        OtpStatus::Expired
    }
}

/// Six decimal digits, uniform over 100000..=999999.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub struct OtpService {
    db: SqlitePool,
    mailer: Arc<dyn Mailer>,
}

impl OtpService {
    pub fn new(db: SqlitePool, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    pub async fn issue(&self, email: &str) -> Result<OtpIssue, AppError> {
        self.issue_code(email, &generate_code(), Utc::now()).await
    }

    /// Stores the code before sending it; a failed send leaves the record in place.
    pub async fn issue_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpIssue, AppError> {
        let record = repository::insert_otp(&self.db, email, code, &format_timestamp(now)).await?;

        let delivered = match self.mailer.send_otp(email, code).await {
            Ok(()) => true,
            Err(e) => {
                warn!("OTP for {} stored but not delivered: {}", email, e);
                false
            }
        };

        info!("Issued OTP for {} (delivered: {})", email, delivered);
        Ok(OtpIssue { record, delivered })
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<OtpStatus, AppError> {
        self.verify_at(email, code, Utc::now()).await
    }

    pub async fn verify_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpStatus, AppError> {
        let record = repository::find_latest_otp(&self.db, email, code).await?;
        Ok(classify(record.as_ref(), now))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::db::connect_in_memory;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_otp(&self, email: &str, otp: &str) -> Result<(), AppError> {
            self.sent.lock().unwrap().push((email.to_string(), otp.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_otp(&self, _email: &str, _otp: &str) -> Result<(), AppError> {
            Err(AppError::InternalServerError)
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 23, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_code_is_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn test_classify_window_boundary() {
        let record = OtpRecord {
            id: 1,
            email: "s@example.com".to_string(),
            otp: "123456".to_string(),
            created_at: format_timestamp(t0()),
        };
        assert_eq!(classify(Some(&record), t0() + Duration::minutes(30)), OtpStatus::Verified);
        assert_eq!(
            classify(Some(&record), t0() + Duration::minutes(30) + Duration::seconds(1)),
            OtpStatus::Expired
        );
        assert_eq!(classify(None, t0()), OtpStatus::Invalid);
    }

    #[tokio::test]
    async fn test_issue_then_verify_over_time() {
        let pool = connect_in_memory().await.unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let service = OtpService::new(pool, mailer.clone());

        let issue = service.issue_code("s@example.com", "123456", t0()).await.unwrap();
        assert!(issue.delivered);
        assert_eq!(
            mailer.sent.lock().unwrap().as_slice(),
            &[("s@example.com".to_string(), "123456".to_string())]
        );

        let at_29 = service
            .verify_at("s@example.com", "123456", t0() + Duration::minutes(29))
            .await
            .unwrap();
        assert_eq!(at_29, OtpStatus::Verified);

        let at_31 = service
            .verify_at("s@example.com", "123456", t0() + Duration::minutes(31))
            .await
            .unwrap();
        assert_eq!(at_31, OtpStatus::Expired);

        let wrong = service
            .verify_at("s@example.com", "654321", t0() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(wrong, OtpStatus::Invalid);

        let other_email = service
            .verify_at("t@example.com", "123456", t0() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(other_email, OtpStatus::Invalid);
    }

    #[tokio::test]
    async fn test_verification_is_repeatable_within_window() {
        let pool = connect_in_memory().await.unwrap();
        let service = OtpService::new(pool, Arc::new(RecordingMailer::default()));
        service.issue_code("s@example.com", "111111", t0()).await.unwrap();

        for minute in [1, 5, 10] {
            let status = service
                .verify_at("s@example.com", "111111", t0() + Duration::minutes(minute))
                .await
                .unwrap();
            assert_eq!(status, OtpStatus::Verified);
        }
    }

    #[tokio::test]
    async fn test_reissued_code_uses_latest_record() {
        let pool = connect_in_memory().await.unwrap();
        let service = OtpService::new(pool, Arc::new(RecordingMailer::default()));
        service.issue_code("s@example.com", "222222", t0()).await.unwrap();
        service
            .issue_code("s@example.com", "222222", t0() + Duration::minutes(20))
            .await
            .unwrap();

        let status = service
            .verify_at("s@example.com", "222222", t0() + Duration::minutes(45))
            .await
            .unwrap();
        assert_eq!(status, OtpStatus::Verified);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_record() {
        let pool = connect_in_memory().await.unwrap();
        let service = OtpService::new(pool, Arc::new(FailingMailer));

        let issue = service.issue_code("s@example.com", "333333", t0()).await.unwrap();
        assert!(!issue.delivered);

        let status = service
            .verify_at("s@example.com", "333333", t0() + Duration::minutes(2))
            .await
            .unwrap();
        assert_eq!(status, OtpStatus::Verified);
    }

    #[test]
    fn test_status_maps_to_errors() {
        assert!(OtpStatus::Verified.into_result().is_ok());
        assert!(matches!(OtpStatus::Expired.into_result(), Err(AppError::OtpExpired)));
        assert!(matches!(OtpStatus::Invalid.into_result(), Err(AppError::OtpInvalid)));
    }
}
