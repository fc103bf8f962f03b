use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::router;
use salonbook::services::identity;
use salonbook::services::notify::email::EmailNotifier;
use salonbook::services::notify::{LogNotifier, Notifier};
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(!config.session_secret.is_empty(), "SESSION_SECRET must be set");

    // `salonbook issue-token <user_id> [hours]` prints a session token for an existing user
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("issue-token") {
        let user_id = args
            .get(2)
            .ok_or_else(|| anyhow::anyhow!("usage: salonbook issue-token <user_id> [hours]"))?;
        let hours: i64 = args.get(3).and_then(|h| h.parse().ok()).unwrap_or(24);
        let token = identity::issue_token(&config.session_secret, user_id, Utc::now() + Duration::hours(hours))?;
        println!("{token}");
        return Ok(());
    }

    let conn = db::init_db(&config.database_url)?;

    let notifier: Arc<dyn Notifier> = if config.email_api_url.is_empty() {
        tracing::warn!("EMAIL_API_URL not set, confirmations will only be logged");
        Arc::new(LogNotifier {
            salon_name: config.salon_name.clone(),
        })
    } else {
        tracing::info!("sending confirmations via {}", config.email_api_url);
        Arc::new(EmailNotifier::new(
            config.email_api_url.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
            config.salon_name.clone(),
        ))
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier,
    });

    let app = router::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
