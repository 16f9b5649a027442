//! # Synergy Hub
//!
//! Loads configuration and the persisted session, connects to the record
//! store and prints the signed-in user's dashboard summary as JSON.
//!
//! ## Usage
//!
//! ```bash
//! SYNERGY_STORE_URL=... SYNERGY_PROJECT_ID=... SYNERGY_PUBLIC_KEY=... cargo run -p synergy-hub
//! ```

use std::sync::Arc;

use synergy_hub::config::Config;
use synergy_hub::dashboard::DashboardSummary;
use synergy_hub::services::Services;
use synergy_shared::auth::Session;
use synergy_shared::store::HttpRecordStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "synergy_hub=debug,synergy_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Synergy Hub v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let store = Arc::new(HttpRecordStore::new(config.store.clone())?);
    let services = Services::new(store);

    let session = Session::load(&config.session_file).await;
    match session.user() {
        Some(user) => tracing::info!(user_id = user.id, role = ?user.role, "Session restored"),
        None => tracing::warn!(path = %config.session_file.display(), "No signed-in user"),
    }

    let summary = DashboardSummary::load(&services, &session, config.recent_activity_limit).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
