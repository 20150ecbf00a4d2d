use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration loaded from environment variables or TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding `sites.json` and one `<site>.json` per site.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// How long a parsed site dataset is reused, in seconds. 0 = always reload.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Graceful shutdown timeout in seconds (default: 30).
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Fragment used to seed the selection at start-up, e.g.
    /// `site=example.com&page=top10`. Empty selects the first site.
    #[serde(default)]
    pub initial_fragment: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

const fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            initial_fragment: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults.
    ///
    /// Environment variables override file values:
    /// - `STATVIEW_HOST` → host
    /// - `STATVIEW_PORT` → port
    /// - `STATVIEW_DATA_DIR` → data_dir
    /// - `STATVIEW_CACHE_TTL` → cache_ttl_secs
    /// - `STATVIEW_SHUTDOWN_TIMEOUT` → shutdown_timeout_secs
    /// - `STATVIEW_FRAGMENT` → initial_fragment
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config =
            config_path.map_or_else(Self::default, |path| match std::fs::read_to_string(path) {
                Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse config file: {e}, using defaults");
                    Self::default()
                }),
                Err(e) => {
                    tracing::warn!("Failed to read config file: {e}, using defaults");
                    Self::default()
                }
            });

        if let Ok(host) = std::env::var("STATVIEW_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("STATVIEW_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(data_dir) = std::env::var("STATVIEW_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(val) = std::env::var("STATVIEW_CACHE_TTL") {
            if let Ok(t) = val.parse() {
                config.cache_ttl_secs = t;
            }
        }
        if let Ok(val) = std::env::var("STATVIEW_SHUTDOWN_TIMEOUT") {
            if let Ok(t) = val.parse() {
                config.shutdown_timeout_secs = t;
            }
        }
        if let Ok(fragment) = std::env::var("STATVIEW_FRAGMENT") {
            config.initial_fragment = fragment;
        }

        config
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
