//! Configuration module for finance-service.

use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct FinanceConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Bearer tokens are HS256 JWTs issued by the hosted auth provider.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub audience: Option<String>,
}

/// OpenAI-compatible chat-completion endpoint used for insights.
/// No API key means the mock provider is used.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub insights_limit: u32,
    pub insights_window_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Zero disables the overdue-debt sweep.
    pub debt_sweep_interval_seconds: u64,
}

impl FinanceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let config = Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "finance-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 2),
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(env::var("AUTH_JWT_SECRET").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("AUTH_JWT_SECRET is required"))
                })?),
                audience: match env::var("AUTH_JWT_AUDIENCE") {
                    Ok(aud) if aud.is_empty() => None,
                    Ok(aud) => Some(aud),
                    Err(_) => Some("authenticated".to_string()),
                },
            },
            llm: LlmConfig {
                api_key: env::var("LLM_API_KEY")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .map(Secret::new),
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout_seconds: parse_env("LLM_TIMEOUT_SECONDS", 60),
            },
            security: SecurityConfig {
                allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                insights_limit: parse_env("INSIGHTS_RATE_LIMIT", 5),
                insights_window_seconds: parse_env("INSIGHTS_RATE_LIMIT_WINDOW_SECONDS", 60),
            },
            scheduler: SchedulerConfig {
                debt_sweep_interval_seconds: parse_env("DEBT_SWEEP_INTERVAL_SECONDS", 86_400),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.database.max_connections == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MAX_CONNECTIONS must be greater than 0"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS cannot exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.llm.timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LLM_TIMEOUT_SECONDS must be positive"
            )));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required() {
        env::set_var("DATABASE_URL", "postgres://localhost/finance");
        env::set_var("AUTH_JWT_SECRET", "secret");
    }

    #[test]
    #[serial]
    fn missing_database_url_is_rejected() {
        env::remove_var("DATABASE_URL");
        env::set_var("AUTH_JWT_SECRET", "secret");
        let err = FinanceConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    #[serial]
    fn defaults_are_applied() {
        set_required();
        env::remove_var("LLM_API_KEY");
        env::remove_var("AUTH_JWT_AUDIENCE");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
        env::remove_var("DATABASE_MIN_CONNECTIONS");

        let config = FinanceConfig::from_env().unwrap();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.audience.as_deref(), Some("authenticated"));
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.scheduler.debt_sweep_interval_seconds, 86_400);
    }

    #[test]
    #[serial]
    fn min_connections_above_max_is_rejected() {
        set_required();
        env::set_var("DATABASE_MAX_CONNECTIONS", "2");
        env::set_var("DATABASE_MIN_CONNECTIONS", "5");
        let result = FinanceConfig::from_env();
        env::remove_var("DATABASE_MAX_CONNECTIONS");
        env::remove_var("DATABASE_MIN_CONNECTIONS");
        assert!(result.is_err());
    }
}
