pub mod auth;
pub mod otp;

pub use auth::{AdminAuth, IssuedToken};
pub use otp::{OtpService, OtpStatus};
