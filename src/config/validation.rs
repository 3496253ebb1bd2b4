//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs and value ranges (timeouts > 0, gas limit > 0)
//! - Check that the seal policy is self-consistent
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ToolingConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use url::Url;

use crate::config::schema::ToolingConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(field, format!("unsupported scheme '{}'", url.scheme()))),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &ToolingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("network.access_url", &config.network.access_url, &mut errors);
    for url in &config.network.failover_urls {
        check_url("network.failover_urls", url, &mut errors);
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be greater than 0"));
    }

    if config.transaction.gas_limit == 0 {
        errors.push(ValidationError::new("transaction.gas_limit", "must be greater than 0"));
    }

    if config.project.service_account.trim().is_empty() {
        errors.push(ValidationError::new("project.service_account", "must not be empty"));
    }
    if config.project.flow_json.as_os_str().is_empty() {
        errors.push(ValidationError::new("project.flow_json", "must not be empty"));
    }

    let seal = &config.seal;
    if seal.poll_interval_ms == 0 {
        errors.push(ValidationError::new("seal.poll_interval_ms", "must be greater than 0"));
    }
    if seal.backoff && seal.max_backoff_ms < seal.poll_interval_ms {
        errors.push(ValidationError::new(
            "seal.max_backoff_ms",
            "must not be smaller than seal.poll_interval_ms",
        ));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ToolingConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ToolingConfig::default();
        config.network.access_url = "grpc://127.0.0.1:3569".to_string();
        config.network.rpc_timeout_secs = 0;
        config.seal.poll_interval_ms = 0;
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "network.access_url",
                "network.rpc_timeout_secs",
                "seal.poll_interval_ms",
                "observability.log_level",
            ]
        );
    }

    #[test]
    fn test_backoff_cap_below_interval() {
        let mut config = ToolingConfig::default();
        config.seal.backoff = true;
        config.seal.max_backoff_ms = 10;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "seal.max_backoff_ms");
    }

    #[test]
    fn test_bad_failover_url() {
        let mut config = ToolingConfig::default();
        config.network.failover_urls.push("nope".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string().split(':').next(), Some("network.failover_urls"));
    }
}
