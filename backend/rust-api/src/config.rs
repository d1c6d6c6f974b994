use serde::Deserialize;
use std::env;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_AI_GRADING_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub ai_grading: AiGradingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiGradingConfig {
    pub url: String,
    pub enabled: bool,
    /// No timeout unless configured; a slow grader is waited on.
    pub timeout_secs: Option<u64>,
    pub max_attempts: usize,
}

impl AiGradingConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for AiGradingConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_AI_GRADING_URL.to_string(),
            enabled: true,
            timeout_secs: None,
            max_attempts: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml first, APP__* environment variables override
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let url = settings
            .get_string("ai_grading.url")
            .or_else(|_| env::var("AI_GRADING_URL"))
            .unwrap_or_else(|_| DEFAULT_AI_GRADING_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let enabled = match settings.get_bool("ai_grading.enabled") {
            Ok(value) => value,
            Err(_) => match env::var("AI_GRADING_ENABLED") {
                Ok(value) => parse_flag("AI_GRADING_ENABLED", &value)?,
                Err(_) => true,
            },
        };

        let timeout_secs = match settings.get_int("ai_grading.timeout_secs") {
            Ok(value) => positive("ai_grading.timeout_secs", value)?,
            Err(_) => match env::var("AI_GRADING_TIMEOUT_SECS") {
                Ok(value) => positive("AI_GRADING_TIMEOUT_SECS", parse_int(&value)?)?,
                Err(_) => None,
            },
        };

        let max_attempts = match settings.get_int("ai_grading.max_attempts") {
            Ok(value) => value,
            Err(_) => match env::var("AI_GRADING_MAX_ATTEMPTS") {
                Ok(value) => parse_int(&value)?,
                Err(_) => 1,
            },
        }
        .max(1) as usize;

        Ok(Config {
            bind_addr,
            ai_grading: AiGradingConfig {
                url,
                enabled,
                timeout_secs,
                max_attempts,
            },
        })
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, config::ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(config::ConfigError::Message(format!(
            "{} must be a boolean, got {:?}",
            key, other
        ))),
    }
}

fn parse_int(value: &str) -> Result<i64, config::ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| config::ConfigError::Message(format!("invalid integer {:?}: {}", value, e)))
}

/// Zero or negative disables the setting.
fn positive(key: &str, value: i64) -> Result<Option<u64>, config::ConfigError> {
    if value <= 0 {
        tracing::debug!("{} <= 0, treating as unset", key);
        return Ok(None);
    }
    Ok(Some(value as u64))
}
