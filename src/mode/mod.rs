//! Transaction mode resolution.
//!
//! # Responsibilities
//! - Decide once per process whether ledger operations are simulated locally
//!   (mock mode) or built, signed and submitted for real
//! - Keep the decision a pure function of its three inputs
//!
//! # Design Decisions
//! - Mock mode is the fallback: real mode needs every input to allow it
//! - `force_real = false` dominates every other input
//! - Never errors; every input combination has an answer

use serde::{Deserialize, Serialize};

use crate::ledger::strkey::{is_placeholder_contract_id, is_valid_contract_id};

/// Build environment the process was configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildTag {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for BuildTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildTag::Development),
            "production" | "prod" => Ok(BuildTag::Production),
            other => Err(format!("unknown build tag '{}'", other)),
        }
    }
}

/// How ledger operations are carried out for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Simulated locally; no network I/O on the submission path.
    Mock,
    /// Built against the configured contract and submitted to the ledger.
    Real,
}

impl TransactionMode {
    pub fn is_mock(self) -> bool {
        matches!(self, TransactionMode::Mock)
    }
}

impl std::fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionMode::Mock => write!(f, "mock"),
            TransactionMode::Real => write!(f, "real"),
        }
    }
}

/// Returns `true` when operations must run in mock mode.
pub fn resolve_mode(force_real: bool, target_id: &str, build_tag: BuildTag) -> bool {
    let invalid_target = target_id.is_empty() || !is_valid_contract_id(target_id);

    is_placeholder_contract_id(target_id)
        || invalid_target
        || build_tag == BuildTag::Development
        || !force_real
}

/// The inputs and the outcome of a mode decision, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeDecision {
    pub force_real: bool,
    pub target_id: String,
    pub build_tag: BuildTag,
    pub placeholder_target: bool,
    pub valid_target: bool,
    pub mode: TransactionMode,
}

impl ModeDecision {
    pub fn resolve(force_real: bool, target_id: &str, build_tag: BuildTag) -> Self {
        let mode = if resolve_mode(force_real, target_id, build_tag) {
            TransactionMode::Mock
        } else {
            TransactionMode::Real
        };

        Self {
            force_real,
            target_id: target_id.to_string(),
            build_tag,
            placeholder_target: is_placeholder_contract_id(target_id),
            valid_target: is_valid_contract_id(target_id),
            mode,
        }
    }

    /// Human-readable reasons mock mode was chosen. Empty in real mode.
    pub fn mock_reasons(&self) -> Vec<&'static str> {
        let mut reasons = Vec::new();
        if self.mode == TransactionMode::Real {
            return reasons;
        }
        if !self.force_real {
            reasons.push("force_real_transactions is not enabled");
        }
        if self.placeholder_target {
            reasons.push("contract id is a placeholder");
        } else if !self.valid_target {
            reasons.push("contract id is not a valid contract strkey");
        }
        if self.build_tag == BuildTag::Development {
            reasons.push("build is tagged development");
        }
        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::strkey::encode_contract;

    fn valid_id() -> String {
        encode_contract(&[42u8; 32])
    }

    #[test]
    fn test_force_flag_off_always_mocks() {
        for target in [valid_id(), "YOUR_CONTRACT_ID".to_string(), String::new(), "junk".into()] {
            for tag in [BuildTag::Development, BuildTag::Production] {
                assert!(resolve_mode(false, &target, tag), "target={target} tag={tag:?}");
            }
        }
    }

    #[test]
    fn test_placeholder_always_mocks() {
        for force in [true, false] {
            for tag in [BuildTag::Development, BuildTag::Production] {
                assert!(resolve_mode(force, "YOUR_CONTRACT_ID", tag));
                assert!(resolve_mode(force, "PLACEHOLDER_CONTRACT_ID", tag));
            }
        }
    }

    #[test]
    fn test_real_mode_requires_every_input() {
        let id = valid_id();
        assert_eq!(id.len(), 56);
        assert!(!resolve_mode(true, &id, BuildTag::Production));

        // Flip one input at a time.
        assert!(resolve_mode(false, &id, BuildTag::Production));
        assert!(resolve_mode(true, "YOUR_CONTRACT_ID", BuildTag::Production));
        assert!(resolve_mode(true, &id, BuildTag::Development));
    }

    #[test]
    fn test_malformed_and_empty_targets() {
        assert!(resolve_mode(true, "", BuildTag::Production));
        assert!(resolve_mode(true, "CNOTAREALCONTRACT", BuildTag::Production));
        // A valid account strkey is not a contract id.
        let account = crate::ledger::strkey::encode_account(&[42u8; 32]);
        assert!(resolve_mode(true, &account, BuildTag::Production));
    }

    #[test]
    fn test_decision_reasons() {
        let decision = ModeDecision::resolve(false, "YOUR_CONTRACT_ID", BuildTag::Development);
        assert_eq!(decision.mode, TransactionMode::Mock);
        assert_eq!(decision.mock_reasons().len(), 3);

        let decision = ModeDecision::resolve(true, &valid_id(), BuildTag::Production);
        assert_eq!(decision.mode, TransactionMode::Real);
        assert!(decision.mock_reasons().is_empty());
    }

    #[test]
    fn test_build_tag_parsing() {
        assert_eq!("production".parse::<BuildTag>().unwrap(), BuildTag::Production);
        assert_eq!("Dev".parse::<BuildTag>().unwrap(), BuildTag::Development);
        assert!("staging".parse::<BuildTag>().is_err());
    }
}
