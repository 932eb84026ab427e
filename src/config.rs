//! Environment-supplied configuration.
//!
//! Values come from the environment with logged defaults; the server binary
//! may override the port from a CLI flag. Google credentials are optional:
//! without them the OAuth routes report a configuration error instead of
//! redirecting.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub session_ttl: Duration,
    pub google: Option<GoogleConfig>,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port: u16 = try_load("ROLODEX_PORT", "3000");
        let ttl_secs: u64 = try_load("ROLODEX_SESSION_TTL_SECS", "3600");
        Self {
            port,
            session_ttl: Duration::from_secs(ttl_secs),
            google: GoogleConfig::from_env(port),
        }
    }
}

impl GoogleConfig {
    fn from_env(port: u16) -> Option<Self> {
        let client_id = env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = match env::var("GOOGLE_CLIENT_SECRET") {
            Ok(s) => s,
            Err(_) => {
                warn!("GOOGLE_CLIENT_ID set but GOOGLE_CLIENT_SECRET missing; OAuth disabled");
                return None;
            }
        };
        let redirect_url = env::var("ROLODEX_OAUTH_REDIRECT")
            .unwrap_or_else(|_| format!("http://localhost:{}/auth/callback", port));
        Some(Self { client_id, client_secret, redirect_url })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| warn!("Invalid {key} value {raw:?}: {e}"))
        .unwrap_or_else(|_| default.parse().map_err(|_| ()).expect("default must parse"))
}
