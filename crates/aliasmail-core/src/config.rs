//! User preferences and client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Domain every account and alias lives under unless configured otherwise.
pub const DEFAULT_ACCOUNT_DOMAIN: &str = "2925.com";

/// Window dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

/// User preferences, persisted through the port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Seconds between automatic refreshes.
    pub auto_refresh_interval: u64,
    /// UI theme name.
    pub theme: String,
    /// Main window size.
    pub window_size: WindowSize,
    /// Re-authenticate silently on startup with the cached secret.
    pub auto_login: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_refresh_interval: 30,
            theme: "light".to_string(),
            window_size: WindowSize::default(),
            auto_login: false,
        }
    }
}

/// How fetched items are matched against aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasMode {
    /// Only addresses in the alias registry count.
    #[default]
    Registry,
    /// Any address that extends the account's local-part counts.
    Inferred,
}

/// Runtime configuration of [`AliasMailClient`](crate::AliasMailClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Time between automatic refreshes.
    pub poll_interval: Duration,
    /// Refresh as soon as polling is enabled.
    pub poll_immediately: bool,
    /// Alias matching mode.
    pub alias_mode: AliasMode,
    /// Required account domain.
    pub account_domain: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            poll_immediately: true,
            alias_mode: AliasMode::default(),
            account_domain: DEFAULT_ACCOUNT_DOMAIN.to_string(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from saved preferences. An interval of zero
    /// falls back to the default.
    #[must_use]
    pub fn from_preferences(preferences: &Preferences) -> Self {
        let default = Self::default();
        let poll_interval = if preferences.auto_refresh_interval == 0 {
            default.poll_interval
        } else {
            Duration::from_secs(preferences.auto_refresh_interval)
        };
        Self {
            poll_interval,
            ..default
        }
    }

    /// Set the alias matching mode.
    #[must_use]
    pub fn with_alias_mode(mut self, mode: AliasMode) -> Self {
        self.alias_mode = mode;
        self
    }

    /// Set the polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
