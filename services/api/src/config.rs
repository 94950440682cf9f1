//! Content service settings
//!
//! Defaults are overridden by `AFFICHE_*` environment variables, e.g.
//! `AFFICHE_BIND_ADDR=127.0.0.1:8080` or `AFFICHE_FUTURE_EVENT_CAP=6`.

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Width of the `messages.content` column
const MESSAGE_COLUMN_CHARS: usize = 500;

/// Runtime settings for the content service
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// HTTP bind address
    pub bind_addr: String,
    /// Maximum number of upcoming events per author
    pub future_event_cap: usize,
    /// Maximum message length in characters
    pub message_max_length: usize,
    /// Messages allowed per window per (user, target)
    pub message_rate_limit: usize,
    /// Rolling window length in seconds
    pub message_rate_window_secs: u64,
}

impl Settings {
    /// Load settings from `AFFICHE_*` environment variables over defaults
    pub fn from_env() -> Result<Self> {
        Self::from_environment(Environment::with_prefix("AFFICHE"))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("bind_addr", "0.0.0.0:3001")?
            .set_default("future_event_cap", 4)?
            .set_default("message_max_length", 500)?
            .set_default("message_rate_limit", 10)?
            .set_default("message_rate_window_secs", 60)?
            .add_source(environment.try_parsing(true))
            .build()?;

        let settings: Settings = settings.try_deserialize()?;

        if settings.future_event_cap == 0 {
            anyhow::bail!("AFFICHE_FUTURE_EVENT_CAP must be at least 1");
        }
        if !(1..=MESSAGE_COLUMN_CHARS).contains(&settings.message_max_length) {
            anyhow::bail!(
                "AFFICHE_MESSAGE_MAX_LENGTH must be between 1 and {}",
                MESSAGE_COLUMN_CHARS
            );
        }
        if settings.message_rate_limit == 0 || settings.message_rate_window_secs == 0 {
            anyhow::bail!("Message rate limit and window must be positive");
        }

        Ok(settings)
    }
}
