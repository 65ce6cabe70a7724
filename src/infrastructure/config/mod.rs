use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Generation backend
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub generation_max_tokens: u32,
    pub generation_timeout_secs: u64,
    // Visitor rate limiting
    pub redis_url: Option<String>,
    pub visitor_limit: u32,
    pub visitor_window_secs: u64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_issuer: optional_var("JWT_ISSUER"),
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            generation_max_tokens: env::var("GENERATION_MAX_TOKENS")
                .unwrap_or_else(|_| "400".to_string())
                .parse()?,
            generation_timeout_secs: env::var("GENERATION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            redis_url: optional_var("REDIS_URL"),
            visitor_limit: env::var("VISITOR_LIMIT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()?,
            visitor_window_secs: env::var("VISITOR_WINDOW_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// A visitor needs at least one request per window, and the window must
    /// have a length for the sliding log to expire entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.visitor_limit == 0 {
            return Err(ConfigError::Invalid("VISITOR_LIMIT must be at least 1"));
        }
        if self.visitor_window_secs == 0 {
            return Err(ConfigError::Invalid("VISITOR_WINDOW_SECS must be at least 1"));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// The backend credential is optional at boot; requests fail with a
    /// misconfiguration error until it is provided.
    pub fn generation_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn visitor_window(&self) -> Duration {
        Duration::from_secs(self.visitor_window_secs)
    }
}

/// Empty values count as unset
fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
