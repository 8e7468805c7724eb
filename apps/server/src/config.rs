use std::{net::SocketAddr, path::PathBuf, time::Duration};

const DEFAULT_LISTEN_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 20_000;

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Directory holding one `<class>_cache.jsonl` file per asset class.
    pub cache_dir: PathBuf,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Deadline for a single source fetch, also used as the HTTP client timeout.
    pub provider_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparsable values fall back to
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("TI_LISTEN_ADDR")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_LISTEN_ADDR));
        let cache_dir = lookup("TI_CACHE_DIR")
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let cors_allow = lookup("TI_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout = millis(&lookup, "TI_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS);
        let provider_timeout =
            millis(&lookup, "TI_PROVIDER_TIMEOUT_MS", DEFAULT_PROVIDER_TIMEOUT_MS);

        Self {
            listen_addr,
            cache_dir,
            cors_allow,
            request_timeout,
            provider_timeout,
        }
    }
}

fn millis<F>(lookup: &F, key: &str, default: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    let ms = lookup(key)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_millis(ms)
}
