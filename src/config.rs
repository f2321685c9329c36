use crate::constants::{
    DEFAULT_AI_API_URL, DEFAULT_AI_MODEL, DEFAULT_FACEBOOK_DIALOG_URL, DEFAULT_GRAPH_API_URL,
    DEFAULT_GRAPH_API_VERSION,
    DEFAULT_REVENUE_PER_RESULT,
};
use std::{collections::HashMap, env, fmt::Display, path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Which token the Facebook proxy forwards to the Graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    Service,
    Caller,
}

impl FromStr for TokenMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "service" | "server" => Ok(Self::Service),
            "user" | "caller" => Ok(Self::Caller),
            other => Err(format!("expected 'service' or 'user', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FacebookConfig {
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Host of the Facebook Login dialog.
    pub dialog_url: String,
    pub access_token: Option<String>,
    pub token_mode: TokenMode,
    pub graph_url: String,
    pub graph_version: String,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub jwt_remember_ttl_secs: i64,
    pub cors_origins: Vec<String>,
    pub revenue_per_result: f64,
    pub http_timeout_secs: u64,
    pub facebook: FacebookConfig,
    pub ai: AiConfig,
}

impl Config {
    /// Reads the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_secret = match optional(vars, "JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set, using an insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            port: try_load(vars, "PORT", "8080")?,
            data_path: PathBuf::from(try_load::<String>(
                vars,
                "APP_DATA_PATH",
                "data/dashboard.json",
            )?),
            jwt_secret,
            jwt_ttl_secs: positive(vars, "JWT_EXPIRES_IN", "86400")?,
            jwt_remember_ttl_secs: positive(vars, "JWT_REMEMBER_EXPIRES_IN", "2592000")?,
            cors_origins: optional(vars, "CORS_ORIGINS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            revenue_per_result: try_load(
                vars,
                "REVENUE_PER_RESULT",
                &DEFAULT_REVENUE_PER_RESULT.to_string(),
            )?,
            http_timeout_secs: try_load(vars, "HTTP_TIMEOUT_SECS", "30")?,
            facebook: FacebookConfig {
                app_id: optional(vars, "FACEBOOK_APP_ID"),
                app_secret: optional(vars, "FACEBOOK_APP_SECRET"),
                redirect_uri: optional(vars, "FACEBOOK_REDIRECT_URI"),
                dialog_url: try_load(vars, "FACEBOOK_DIALOG_URL", DEFAULT_FACEBOOK_DIALOG_URL)?,
                access_token: optional(vars, "FACEBOOK_ACCESS_TOKEN"),
                token_mode: try_load(vars, "FACEBOOK_TOKEN_MODE", "service")?,
                graph_url: try_load(vars, "GRAPH_API_URL", DEFAULT_GRAPH_API_URL)?,
                graph_version: try_load(vars, "GRAPH_API_VERSION", DEFAULT_GRAPH_API_VERSION)?,
            },
            ai: AiConfig {
                api_key: optional(vars, "AI_API_KEY"),
                api_url: try_load(vars, "AI_API_URL", DEFAULT_AI_API_URL)?,
                model: try_load(vars, "AI_MODEL", DEFAULT_AI_MODEL)?,
            },
        })
    }
}

fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = optional(vars, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn positive(vars: &HashMap<String, String>, key: &str, default: &str) -> Result<i64, ConfigError> {
    let value: i64 = try_load(vars, key, default)?;
    if value <= 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
