//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use saga::{RetryPolicy, StepPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string; unset means in-memory storage
/// - `PAYMENT_SERVICE_URL`, `INVENTORY_SERVICE_URL`: remote capability base
///   URLs; unset means in-process services
/// - `CAPABILITY_TIMEOUT_MS`: per-request timeout of remote calls (default: 2000)
/// - `STEP_DEADLINE_MS`: time budget of one saga step (default: 5000)
/// - `RETRY_MAX_ATTEMPTS`, `RETRY_INITIAL_DELAY_MS`: transport retry policy
///   (default: 3 attempts, 100ms)
/// - `PAYMENT_APPROVAL_RATE`, `REFUND_APPROVAL_RATE`: in-process approval
///   probabilities (default: 0.9 and 0.95)
/// - `SEED_SAMPLE_DATA`: seed the sample catalog at startup (default: true)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub payment_service_url: Option<String>,
    pub inventory_service_url: Option<String>,
    pub capability_timeout: Duration,
    pub step_deadline: Duration,
    pub retry_max_attempts: u32,
    pub retry_initial_delay: Duration,
    pub payment_approval_rate: f64,
    pub refund_approval_rate: f64,
    pub seed_sample_data: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Missing, empty or unparsable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let env = Env(&lookup);

        Self {
            host: env.string("HOST").unwrap_or(defaults.host),
            port: env.parse("PORT").unwrap_or(defaults.port),
            log_level: env.string("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: env.string("DATABASE_URL"),
            payment_service_url: env.string("PAYMENT_SERVICE_URL"),
            inventory_service_url: env.string("INVENTORY_SERVICE_URL"),
            capability_timeout: env
                .millis("CAPABILITY_TIMEOUT_MS")
                .unwrap_or(defaults.capability_timeout),
            step_deadline: env
                .millis("STEP_DEADLINE_MS")
                .unwrap_or(defaults.step_deadline),
            retry_max_attempts: env
                .parse("RETRY_MAX_ATTEMPTS")
                .unwrap_or(defaults.retry_max_attempts),
            retry_initial_delay: env
                .millis("RETRY_INITIAL_DELAY_MS")
                .unwrap_or(defaults.retry_initial_delay),
            payment_approval_rate: env
                .parse("PAYMENT_APPROVAL_RATE")
                .unwrap_or(defaults.payment_approval_rate),
            refund_approval_rate: env
                .parse("REFUND_APPROVAL_RATE")
                .unwrap_or(defaults.refund_approval_rate),
            seed_sample_data: env
                .parse("SEED_SAMPLE_DATA")
                .unwrap_or(defaults.seed_sample_data),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the deadline and retry policy applied to saga steps.
    pub fn step_policy(&self) -> StepPolicy {
        StepPolicy {
            deadline: self.step_deadline,
            retry: RetryPolicy {
                max_attempts: self.retry_max_attempts,
                initial_delay: self.retry_initial_delay,
                ..RetryPolicy::default()
            },
        }
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Non-blank value of a variable.
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        let value = self.string(key)?;
        match value.trim().parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!(key, %value, "ignoring unparsable configuration value");
                None
            }
        }
    }

    fn millis(&self, key: &str) -> Option<Duration> {
        self.parse(key).map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            payment_service_url: None,
            inventory_service_url: None,
            capability_timeout: Duration::from_millis(2000),
            step_deadline: Duration::from_millis(5000),
            retry_max_attempts: 3,
            retry_initial_delay: Duration::from_millis(100),
            payment_approval_rate: 0.9,
            refund_approval_rate: 0.95,
            seed_sample_data: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.step_deadline, Duration::from_secs(5));
        assert!(config.seed_sample_data);
    }

    #[test]
    fn test_empty_lookup_matches_defaults() {
        assert_eq!(from_pairs(&[]), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "8081"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("PAYMENT_SERVICE_URL", "http://payments:8080"),
            ("STEP_DEADLINE_MS", "250"),
            ("RETRY_MAX_ATTEMPTS", "5"),
            ("PAYMENT_APPROVAL_RATE", "1.0"),
            ("SEED_SAMPLE_DATA", "false"),
        ]);

        assert_eq!(config.port, 8081);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/orders")
        );
        assert_eq!(
            config.payment_service_url.as_deref(),
            Some("http://payments:8080")
        );
        assert!(config.inventory_service_url.is_none());
        assert_eq!(config.step_deadline, Duration::from_millis(250));
        assert_eq!(config.retry_max_attempts, 5);
        assert_eq!(config.payment_approval_rate, 1.0);
        assert!(!config.seed_sample_data);
    }

    #[test]
    fn test_invalid_and_blank_values_fall_back() {
        let config = from_pairs(&[("PORT", "not-a-port"), ("DATABASE_URL", "  ")]);
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_step_policy() {
        let config = from_pairs(&[("STEP_DEADLINE_MS", "900"), ("RETRY_INITIAL_DELAY_MS", "20")]);
        let policy = config.step_policy();
        assert_eq!(policy.deadline, Duration::from_millis(900));
        assert_eq!(policy.retry.max_attempts, 3);
        assert_eq!(policy.retry.initial_delay, Duration::from_millis(20));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
