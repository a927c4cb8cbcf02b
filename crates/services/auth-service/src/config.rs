//! Auth service configuration.
//!
//! Loaded from environment variables (and `.env` via dotenvy). Anything
//! malformed is reported as a [`ConfigError`] and aborts startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use common::config::{duration_or, lookup, parse_or, string_or};
use common::{ConfigError, DatabaseConfig, JwtConfig, ServiceConfig};
use domain::{DEFAULT_JWT_EXPIRATION_HOURS, MIN_JWT_SECRET_LENGTH};

/// Default budget for the whole register workflow.
pub const DEFAULT_REGISTER_TIMEOUT: Duration = Duration::from_secs(4);

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    /// Upper bound on a single register call
    pub register_timeout: Duration,
    /// JSON file with the role→operations policy; the standard table if unset
    pub rbac_policy_path: Option<PathBuf>,
}

impl AuthServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            service: service_from(&env)?,
            database: database_from(&env)?,
            jwt: jwt_from(&env)?,
            register_timeout: duration_or(
                &env,
                &["AUTH_SERVICE_REGISTER_TIMEOUT", "REGISTER_TIMEOUT"],
                DEFAULT_REGISTER_TIMEOUT,
            )?,
            rbac_policy_path: lookup(&env, &["AUTH_SERVICE_RBAC_POLICY", "RBAC_POLICY_PATH"])
                .map(|(_, path)| PathBuf::from(path)),
        })
    }

    /// Database settings only (for migration commands).
    pub fn database_from_env() -> Result<DatabaseConfig, ConfigError> {
        dotenvy::dotenv().ok();
        database_from(&|key: &str| env::var(key).ok())
    }
}

fn service_from<F>(env: &F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ServiceConfig::default();
    Ok(ServiceConfig {
        service_name: "auth-service".to_string(),
        host: string_or(env, &["AUTH_SERVICE_HOST", "SERVER_HOST"], &defaults.host),
        port: parse_or(env, &["AUTH_SERVICE_PORT", "SERVER_PORT"], defaults.port)?,
        log_level: string_or(env, &["AUTH_SERVICE_LOG_LEVEL", "LOG_LEVEL"], &defaults.log_level),
        request_timeout: duration_or(
            env,
            &["AUTH_SERVICE_REQUEST_TIMEOUT", "REQUEST_TIMEOUT"],
            defaults.request_timeout,
        )?,
    })
}

fn database_from<F>(env: &F) -> Result<DatabaseConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = DatabaseConfig::default();
    let config = DatabaseConfig {
        host: string_or(env, &["DATABASE_HOST"], &defaults.host),
        port: parse_or(env, &["DATABASE_PORT"], defaults.port)?,
        username: string_or(env, &["DATABASE_USER"], &defaults.username),
        password: string_or(env, &["DATABASE_PASSWORD"], &defaults.password),
        database: string_or(env, &["DATABASE_NAME"], &defaults.database),
        max_connections: parse_or(env, &["DATABASE_MAX_CONNECTIONS"], defaults.max_connections)?,
        min_connections: parse_or(env, &["DATABASE_MIN_CONNECTIONS"], defaults.min_connections)?,
        idle_timeout: duration_or(env, &["DATABASE_IDLE_TIMEOUT"], defaults.idle_timeout)?,
        health_check_interval: duration_or(
            env,
            &["DATABASE_HEALTH_CHECK_INTERVAL"],
            defaults.health_check_interval,
        )?,
    };

    if config.max_connections == 0 || config.min_connections > config.max_connections {
        return Err(ConfigError::invalid(
            "DATABASE_MIN_CONNECTIONS",
            &config.min_connections.to_string(),
            format!("must be between 0 and max connections ({})", config.max_connections),
        ));
    }

    Ok(config)
}

fn jwt_from<F>(env: &F) -> Result<JwtConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (key, secret) = lookup(env, &["JWT_SECRET", "AUTH_SERVICE_JWT_SECRET"])
        .ok_or_else(|| ConfigError::Missing("JWT_SECRET".to_string()))?;
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::invalid(
            &key,
            "[REDACTED]",
            format!("must be at least {} characters", MIN_JWT_SECRET_LENGTH),
        ));
    }

    let hours_keys = ["JWT_EXPIRATION_HOURS", "AUTH_SERVICE_JWT_EXPIRATION_HOURS"];
    let expiration_hours = parse_or(env, &hours_keys, DEFAULT_JWT_EXPIRATION_HOURS)?;
    if expiration_hours <= 0 {
        return Err(ConfigError::invalid(
            hours_keys[0],
            &expiration_hours.to_string(),
            "must be positive",
        ));
    }

    Ok(JwtConfig {
        secret,
        expiration_hours,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "test-secret-key-for-testing-only-32chars";

    fn load(vars: &[(&str, &str)]) -> Result<AuthServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuthServiceConfig::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_only_secret() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.service.port, 50051);
        assert_eq!(config.jwt.expiration_hours, 24);
        assert_eq!(config.register_timeout, DEFAULT_REGISTER_TIMEOUT);
        assert!(config.rbac_policy_path.is_none());
    }

    #[test]
    fn test_reads_all_settings() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("JWT_EXPIRATION_HOURS", "12"),
            ("AUTH_SERVICE_PORT", "6000"),
            ("LOG_LEVEL", "debug"),
            ("DATABASE_HOST", "db"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("DATABASE_MIN_CONNECTIONS", "2"),
            ("DATABASE_IDLE_TIMEOUT", "5m"),
            ("DATABASE_HEALTH_CHECK_INTERVAL", "30s"),
            ("RBAC_POLICY_PATH", "/etc/auth/policy.json"),
        ])
        .unwrap();

        assert_eq!(config.jwt.expiration_hours, 12);
        assert_eq!(config.service.addr(), "0.0.0.0:6000");
        assert_eq!(config.service.log_level, "debug");
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.idle_timeout, Duration::from_secs(300));
        assert_eq!(config.database.health_check_interval, Duration::from_secs(30));
        assert_eq!(
            config.rbac_policy_path,
            Some(PathBuf::from("/etc/auth/policy.json"))
        );
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_short_secret_is_fatal() {
        assert!(load(&[("JWT_SECRET", "short")]).is_err());
    }

    #[test]
    fn test_malformed_duration_is_fatal() {
        let result = load(&[("JWT_SECRET", SECRET), ("DATABASE_IDLE_TIMEOUT", "ten minutes")]);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_inverted_pool_bounds_are_fatal() {
        let result = load(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_MIN_CONNECTIONS", "5"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_secret_never_printed() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}
