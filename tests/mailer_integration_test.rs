use std::sync::Arc;
use std::time::Duration;

use cgpa_backend::{
    config::{DEFAULT_MAIL_TIMEOUT_SECS, MailConfig},
    db,
    mailer::{HttpMailer, Mailer},
    services::{OtpService, OtpStatus},
};

fn mail_config_from_env() -> MailConfig {
    dotenvy::dotenv().ok();
    MailConfig {
        relay_url: std::env::var("MAIL_RELAY_URL").expect("MAIL_RELAY_URL is not set"),
        api_key: std::env::var("MAIL_API_KEY").expect("MAIL_API_KEY is not set"),
        from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@cgpa.local".to_string()),
        timeout: Duration::from_secs(DEFAULT_MAIL_TIMEOUT_SECS),
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
async fn test_send_otp_through_relay() {
    let recipient = std::env::var("MAIL_TEST_RECIPIENT").expect("MAIL_TEST_RECIPIENT is not set");
    let mailer = HttpMailer::new(mail_config_from_env()).expect("Failed to create mailer");

    let result = mailer.send_otp(&recipient, "123456").await;
    println!("Send result: {:?}", result);
    assert!(result.is_ok(), "Relay rejected the OTP mail");
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored --test-threads=1
async fn test_issue_and_verify_with_relay() {
    let recipient = std::env::var("MAIL_TEST_RECIPIENT").expect("MAIL_TEST_RECIPIENT is not set");
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    let mailer = Arc::new(HttpMailer::new(mail_config_from_env()).expect("Failed to create mailer"));

    let service = OtpService::new(pool, mailer);
    let issue = service.issue(&recipient).await.expect("Failed to issue OTP");
    assert!(issue.delivered, "OTP was stored but not delivered");

    let status = service
        .verify(&recipient, &issue.record.otp)
        .await
        .expect("Failed to verify OTP");
    assert_eq!(status, OtpStatus::Verified);
}
