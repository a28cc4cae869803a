use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::config::MailConfig;
use crate::error::AppError;

pub const OTP_SUBJECT: &str = "Your CGPA Calculator OTP";

/// Delivers one-time codes to students.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), AppError>;
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    text: String,
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), AppError> {
        let request_body = SendMailRequest {
            from: &self.config.from,
            to: vec![email],
            subject: OTP_SUBJECT,
            text: format!("Your OTP is {}", otp),
        };

        let response = self.client
            .post(&self.config.relay_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("mail relay unreachable: {}", e);
                AppError::InternalServerError
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("mail relay rejected message to {}: {} {}", email, status, body);
            return Err(AppError::InternalServerError);
        }

        info!("OTP mail accepted by relay for {}", email);
        Ok(())
    }
}

/// Writes the dispatch to the log instead of sending anything.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), AppError> {
        info!("{} for {}: {}", OTP_SUBJECT, email, otp);
        Ok(())
    }
}
