//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and value ranges
//! - Report contract id problems without rejecting the config
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BookieConfig → Result<(), Vec<ValidationIssue>>
//! - An unusable contract id only forces mock mode, so it is a warning

use crate::config::schema::BookieConfig;
use crate::ledger::strkey::{is_placeholder_contract_id, is_valid_contract_id};

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn issue(field: &'static str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        field,
        message: message.into(),
    }
}

/// Validate a loaded configuration. Returns every fatal issue found.
pub fn validate_config(config: &BookieConfig) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    for (field, value) in [
        ("network.rpc_url", config.network.rpc_url()),
        ("network.horizon_url", config.network.horizon_url()),
    ] {
        match url::Url::parse(value) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => issues.push(issue(field, format!("unsupported scheme '{}'", u.scheme()))),
            Err(e) => issues.push(issue(field, format!("invalid URL '{}': {}", value, e))),
        }
    }

    if config.network.rpc_timeout_secs == 0 {
        issues.push(issue("network.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.polling.max_attempts == 0 {
        issues.push(issue("polling.max_attempts", "must be greater than 0"));
    }
    if config.polling.max_delay_ms < config.polling.interval_ms {
        issues.push(issue(
            "polling.max_delay_ms",
            "must not be smaller than polling.interval_ms",
        ));
    }
    if config.simulation.max_attempts == 0 {
        issues.push(issue("simulation.max_attempts", "must be greater than 0"));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Non-fatal observations about the contract id. These explain a mock-mode decision.
pub fn contract_warnings(config: &BookieConfig) -> Vec<ValidationIssue> {
    let id = config.contract.id.as_str();
    if id.is_empty() {
        vec![issue("contract.id", "not set")]
    } else if is_placeholder_contract_id(id) {
        vec![issue("contract.id", format!("'{}' is a placeholder", id))]
    } else if !is_valid_contract_id(id) {
        vec![issue("contract.id", format!("'{}' is not a contract strkey", id))]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BookieConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_issues() {
        let mut config = BookieConfig::default();
        config.network.rpc_url = "not a url".into();
        config.network.horizon_url = "ftp://horizon".into();
        config.polling.max_attempts = 0;
        config.simulation.max_attempts = 0;

        let issues = validate_config(&config).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().any(|i| i.field == "network.rpc_url"));
        assert!(issues.iter().any(|i| i.message.contains("ftp")));
    }

    #[test]
    fn test_placeholder_contract_is_a_warning() {
        let config = BookieConfig::default();
        assert!(validate_config(&config).is_ok());
        let warnings = contract_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("placeholder"));
    }
}
