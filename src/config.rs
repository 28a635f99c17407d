use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_MAX_RESUME_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub backend_url: String,
    pub backend_upload_url: String,
    pub proxy_timeout_secs: u64,
    pub max_resume_bytes: u64,
    /// Client-side cap on answered turns; `None` leaves completion to the server alone.
    pub interview_turn_cap: Option<u32>,
    pub alternative_vacancies: usize,
    /// Interviews untouched for this long are dropped from memory.
    pub interview_idle_ttl_secs: u64,
    pub demo_backend: bool,
    pub seed_test_data: bool,
    pub jwt_secret: Option<String>,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let backend_url = get_env_or("BACKEND_URL", "http://backend:8000");
        let backend_upload_url = env::var("BACKEND_UPLOAD_URL").unwrap_or_else(|_| backend_url.clone());
        let demo_backend = get_env_parse_or("DEMO_BACKEND", false)?;
        let jwt_secret = env::var("JWT_SECRET").ok();
        if demo_backend && jwt_secret.is_none() {
            return Err(Error::Config(
                "JWT_SECRET is required when DEMO_BACKEND is enabled".to_string(),
            ));
        }

        let turn_cap: u32 = get_env_parse_or("INTERVIEW_TURN_CAP", 5)?;
        let log_format = match get_env_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(Error::Config(format!("Invalid value for LOG_FORMAT: {}", other)))
            }
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:3000"),
            backend_url: trim_base(backend_url),
            backend_upload_url: trim_base(backend_upload_url),
            proxy_timeout_secs: get_env_parse_or("PROXY_TIMEOUT_SECS", 30)?,
            max_resume_bytes: get_env_parse_or("MAX_RESUME_BYTES", DEFAULT_MAX_RESUME_BYTES)?,
            interview_turn_cap: (turn_cap > 0).then_some(turn_cap),
            alternative_vacancies: get_env_parse_or("ALTERNATIVE_VACANCIES", 3)?,
            interview_idle_ttl_secs: get_env_parse_or("INTERVIEW_IDLE_TTL_SECS", 1800)?,
            demo_backend,
            seed_test_data: get_env_parse_or("SEED_TEST_DATA", false)?,
            jwt_secret,
            log_format,
        })
    }

    /// Defaults pointed at one backend, for tests and embedding.
    pub fn for_backend(backend_url: impl Into<String>) -> Self {
        let backend_url = trim_base(backend_url.into());
        Self {
            server_address: "127.0.0.1:0".to_string(),
            backend_upload_url: backend_url.clone(),
            backend_url,
            proxy_timeout_secs: 30,
            max_resume_bytes: DEFAULT_MAX_RESUME_BYTES,
            interview_turn_cap: Some(5),
            alternative_vacancies: 3,
            interview_idle_ttl_secs: 1800,
            demo_backend: false,
            seed_test_data: false,
            jwt_secret: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_backend_strips_trailing_slash() {
        let config = Config::for_backend("http://localhost:8000/");
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.backend_upload_url, "http://localhost:8000");
        assert_eq!(config.interview_turn_cap, Some(5));
        assert_eq!(config.max_resume_bytes, 10 * 1024 * 1024);
    }
}
