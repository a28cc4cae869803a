use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cgpa_backend::api::router;
use cgpa_backend::config::AppConfig;
use cgpa_backend::db;
use cgpa_backend::mailer::{HttpMailer, LogMailer, Mailer};
use cgpa_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cgpa_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let mailer: Arc<dyn Mailer> = match config.mail.clone() {
        Some(mail) => {
            info!("delivering OTP mail through {}", mail.relay_url);
            Arc::new(HttpMailer::new(mail)?)
        }
        None => {
            info!("MAIL_RELAY_URL not set, OTP codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = AppState::new(pool, &config, mailer);
    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
