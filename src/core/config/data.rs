use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::endpoint::EndpointConfig;
use crate::core::mode::Mode;
use crate::utils::url::non_blank;

pub const DEFAULT_GREETING: &str = "Hello! I am your central AI assistant. You can upload CSV/PDF files or ask me about your database.";

pub const ENV_API_URL: &str = "DATACHAT_API_URL";
pub const ENV_BACKEND_URL: &str = "DATACHAT_BACKEND_URL";
pub const ENV_TOKEN: &str = "DATACHAT_TOKEN";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Primary API base override (e.g., "https://dash.example.com")
    pub api_url: Option<String>,
    /// Secondary API base override, used when `api_url` is unset
    pub backend_url: Option<String>,
    /// Fall back to the local development proxy when no override is set.
    /// Defaults to true in debug builds.
    pub development: Option<bool>,
    /// Mode used when none is given on the command line
    pub default_mode: Option<Mode>,
    /// Seconds allowed for establishing the connection
    pub connect_timeout_secs: Option<u64>,
    /// Seconds allowed between two body chunks of a streaming response
    pub read_timeout_secs: Option<u64>,
    /// Opening assistant message; an empty string disables it
    pub greeting: Option<String>,
}

/// Environment values, captured once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub api_url: Option<String>,
    pub backend_url: Option<String>,
    pub token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var(ENV_API_URL).ok(),
            backend_url: std::env::var(ENV_BACKEND_URL).ok(),
            token: std::env::var(ENV_TOKEN).ok(),
        }
    }
}

/// Fully resolved settings handed to the chat client at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base: String,
    pub default_mode: Mode,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub greeting: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Config::default().resolve(&EnvOverrides::default(), None)
    }
}

impl Config {
    pub fn endpoint_config(&self, env: &EnvOverrides, cli_api_url: Option<&str>) -> EndpointConfig {
        let api_url = non_blank(cli_api_url)
            .or_else(|| non_blank(env.api_url.as_deref()))
            .or_else(|| non_blank(self.api_url.as_deref()))
            .map(str::to_owned);
        let backend_url = non_blank(env.backend_url.as_deref())
            .or_else(|| non_blank(self.backend_url.as_deref()))
            .map(str::to_owned);

        EndpointConfig {
            api_url,
            backend_url,
            development: self.development.unwrap_or(cfg!(debug_assertions)),
        }
    }

    pub fn resolve(&self, env: &EnvOverrides, cli_api_url: Option<&str>) -> ClientSettings {
        let greeting = match self.greeting.as_deref() {
            Some(text) => non_blank(Some(text)).map(str::to_owned),
            None => Some(DEFAULT_GREETING.to_string()),
        };

        ClientSettings {
            api_base: self.endpoint_config(env, cli_api_url).resolve_api_base(),
            default_mode: self.default_mode.unwrap_or_default(),
            connect_timeout: self
                .connect_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            read_timeout: self
                .read_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            greeting,
        }
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
