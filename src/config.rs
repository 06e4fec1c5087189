use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Process configuration, read once at startup and passed into handlers via
/// the shared application context. No module-level globals.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub app_env: String,
    /// CORS allow-list; a `*` entry allows any origin.
    pub allowed_origins: Vec<String>,
    /// Both must be set for the image provider to be configured.
    pub image_dir: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub max_upload_bytes: usize,
    /// Requests allowed per client per window; 0 disables the limiter.
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: parse_or("PORT", 5000),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            ),
            image_dir: env::var("IMAGE_DIR").ok().map(PathBuf::from),
            public_base_url: env::var("PUBLIC_BASE_URL").ok(),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            rate_limit_max: parse_or("RATE_LIMIT_MAX", 0),
            rate_limit_window: Duration::from_secs(parse_or("RATE_LIMIT_WINDOW_SECS", 60)),
        }
    }
}

fn parse_or<T: FromStr + Display + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_splits_and_trims() {
        let origins = parse_origins("https://a.example, https://b.example ,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_parse_origins_wildcard() {
        assert_eq!(parse_origins("*"), vec!["*"]);
    }
}
