pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod grading;
pub mod mailer;
pub mod models;
pub mod pagination;
pub mod services;
pub mod state;
