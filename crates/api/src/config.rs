use std::time::Duration;

use imagine_provider::DEFAULT_BASE_URL;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// ImaginePro bearer token. Empty means unconfigured.
    pub api_key: String,
    pub provider_base_url: String,
    /// Root of the generation folders, also served under `/output`.
    pub output_dir: String,
    /// Front-end assets served for any unmatched path.
    pub static_dir: String,
    pub poll_interval_ms: u64,
    /// Give up tracking a job after this many status checks. `None` polls
    /// until a terminal status.
    pub max_poll_attempts: Option<u32>,
    pub provider_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                            |
    /// |-------------------------|------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                          |
    /// | `PORT`                  | `5000`                             |
    /// | `CORS_ORIGINS`          | `http://localhost:5000`            |
    /// | `REQUEST_TIMEOUT_SECS`  | `60`                               |
    /// | `IMAGINEPRO_API_KEY`    | empty                              |
    /// | `IMAGINEPRO_BASE_URL`   | `https://api.imaginepro.ai/api/v1` |
    /// | `OUTPUT_DIR`            | `output`                           |
    /// | `STATIC_DIR`            | `static`                           |
    /// | `POLL_INTERVAL_MS`      | `2000`                             |
    /// | `MAX_POLL_ATTEMPTS`     | unset                              |
    /// | `PROVIDER_TIMEOUT_SECS` | `30`                               |
    /// | `DOWNLOAD_TIMEOUT_SECS` | `30`                               |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Panics on unparseable numeric values: misconfiguration should fail
    /// at startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");

        let port: u16 = var("PORT", "5000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = var("CORS_ORIGINS", "http://localhost:5000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS", "60")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let poll_interval_ms: u64 = var("POLL_INTERVAL_MS", "2000")
            .parse()
            .expect("POLL_INTERVAL_MS must be a valid u64");

        let max_poll_attempts = lookup("MAX_POLL_ATTEMPTS")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>()
                    .expect("MAX_POLL_ATTEMPTS must be a valid u32")
            });

        let provider_timeout_secs: u64 = var("PROVIDER_TIMEOUT_SECS", "30")
            .parse()
            .expect("PROVIDER_TIMEOUT_SECS must be a valid u64");

        let download_timeout_secs: u64 = var("DOWNLOAD_TIMEOUT_SECS", "30")
            .parse()
            .expect("DOWNLOAD_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            api_key: var("IMAGINEPRO_API_KEY", "").trim().to_string(),
            provider_base_url: var("IMAGINEPRO_BASE_URL", DEFAULT_BASE_URL),
            output_dir: var("OUTPUT_DIR", "output"),
            static_dir: var("STATIC_DIR", "static"),
            poll_interval_ms,
            max_poll_attempts,
            provider_timeout_secs,
            download_timeout_secs,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
