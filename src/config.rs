use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use directories::ProjectDirs;
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_ALERT_TTL: Duration = Duration::from_secs(3);
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub auth_file: PathBuf,
    pub alert_ttl: Duration,
    pub redirect_delay: Duration,
}

impl ClientConfig {
    /// Reads `.env` and the process environment, falling back to defaults.
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            api_url: normalize_url(&try_load("TODO_API_URL", DEFAULT_API_URL.to_string())),
            auth_file: var("TODO_AUTH_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_auth_file()),
            alert_ttl: Duration::from_millis(try_load("TODO_ALERT_TTL_MS", 3000)),
            redirect_delay: Duration::from_millis(try_load("TODO_REDIRECT_DELAY_MS", 2000)),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_url(api_url);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_file: default_auth_file(),
            alert_ttl: DEFAULT_ALERT_TTL,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
        }
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn default_auth_file() -> PathBuf {
    ProjectDirs::from("com", "todo", "todo-web-client")
        .map(|dirs| dirs.data_dir().join("storage.json"))
        .unwrap_or_else(|| PathBuf::from(".todo").join("storage.json"))
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not set, using default");
    })
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = var(key) else {
        return default;
    };
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}
