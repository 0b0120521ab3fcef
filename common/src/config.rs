// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use config::{Config as ConfigFile, File, Environment};

/// Central configuration for the feed client
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub twitch: TwitchConfig,
    pub timing: TimingConfig,

    /// File backing the persistent token store
    pub store_path: String,
}

/// Vendor endpoints and OAuth application settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitchConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: String,
    pub authorize_url: String,
    pub users_url: String,
    pub pubsub_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub ping_interval_secs: u64,
    pub reconnect_delay_secs: u64,
    pub token_ttl_secs: i64,
    pub overlay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            twitch: TwitchConfig::default(),
            timing: TimingConfig::default(),
            store_path: "./feed-client-store.json".to_string(),
        }
    }
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: "kffl4m23apylc95ljz5tepdaib2r51".to_string(),
            redirect_uri: "https://hellbz.github.io/Signal-RGB-Twitch".to_string(),
            scopes: "user:read:email channel:read:subscriptions".to_string(),
            authorize_url: "https://id.twitch.tv/oauth2/authorize".to_string(),
            users_url: "https://api.twitch.tv/helix/users".to_string(),
            pubsub_url: "wss://pubsub-edge.twitch.tv".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 300,
            reconnect_delay_secs: 120,
            token_ttl_secs: 3600,
            overlay_secs: 3,
        }
    }
}

impl TimingConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs)
    }

    pub fn overlay_duration(&self) -> Duration {
        Duration::from_secs(self.overlay_secs)
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Environment variables with prefix "APP", e.g. APP__TWITCH__CLIENT_ID
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files, falling back to defaults plus plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                let mut config = Self::default();

                if let Ok(client_id) = env::var("TWITCH_CLIENT_ID") {
                    config.twitch.client_id = client_id;
                }
                if let Ok(redirect_uri) = env::var("TWITCH_REDIRECT_URI") {
                    config.twitch.redirect_uri = redirect_uri;
                }
                if let Ok(store_path) = env::var("FEED_STORE_PATH") {
                    config.store_path = store_path;
                }

                config
            }
        }
    }
}
