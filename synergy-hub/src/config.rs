//! Configuration management for the hub
//!
//! # Environment Variables
//!
//! - `SYNERGY_STORE_URL`, `SYNERGY_PROJECT_ID`, `SYNERGY_PUBLIC_KEY`: record
//!   store access (required)
//! - `SYNERGY_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: none)
//! - `SYNERGY_SESSION_FILE`: persisted current user (default:
//!   `.synergy/session.json`)
//! - `SYNERGY_RECENT_ACTIVITY_LIMIT`: activities on the dashboard (default: 10)
//! - `RUST_LOG`: log filter
//!
//! # Example
//!
//! ```no_run
//! use synergy_hub::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Session file: {}", config.session_file.display());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::PathBuf;

use synergy_shared::store::StoreConfig;

use crate::services::activities::DEFAULT_RECENT_LIMIT;

/// Default location of the persisted session
pub const DEFAULT_SESSION_FILE: &str = ".synergy/session.json";

/// Complete hub configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,

    pub session_file: PathBuf,

    /// Activities shown in the dashboard feed
    pub recent_activity_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let store = StoreConfig::from_env()?;

        let session_file = env::var("SYNERGY_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE));

        let recent_activity_limit = match env::var("SYNERGY_RECENT_ACTIVITY_LIMIT") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| {
                anyhow::anyhow!("SYNERGY_RECENT_ACTIVITY_LIMIT must be a number: {}", e)
            })?,
            Err(_) => DEFAULT_RECENT_LIMIT,
        };

        if recent_activity_limit == 0 {
            anyhow::bail!("SYNERGY_RECENT_ACTIVITY_LIMIT must be greater than zero");
        }

        Ok(Self {
            store,
            session_file,
            recent_activity_limit,
        })
    }
}
