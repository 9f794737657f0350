use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which approval stage a role is entitled to act on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DecisionStage {
    Director,
    Chairman,
}

/// Closed set of roles. Persisted and serialized as snake_case strings;
/// anything else is rejected at the parsing boundary.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Director,
    Chairman,
}

impl Role {
    /// Only teachers submit, edit, or delete their own requests.
    pub const fn may_submit(self) -> bool {
        matches!(self, Role::Teacher)
    }

    /// Decision stage this role owns, if any. Exhaustive on purpose: adding a
    /// role forces a decision here instead of falling through to Forbidden.
    pub const fn decision_stage(self) -> Option<DecisionStage> {
        match self {
            Role::Teacher => None,
            Role::Director => Some(DecisionStage::Director),
            Role::Chairman => Some(DecisionStage::Chairman),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_and_prints_snake_case() {
        assert_eq!(Role::from_str("teacher").unwrap(), Role::Teacher);
        assert_eq!(Role::from_str("director").unwrap(), Role::Director);
        assert_eq!(Role::from_str("chairman").unwrap(), Role::Chairman);
        assert_eq!(Role::Chairman.to_string(), "chairman");
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn capability_mapping() {
        assert!(Role::Teacher.may_submit());
        assert!(!Role::Director.may_submit());
        assert!(!Role::Chairman.may_submit());

        assert_eq!(Role::Teacher.decision_stage(), None);
        assert_eq!(Role::Director.decision_stage(), Some(DecisionStage::Director));
        assert_eq!(Role::Chairman.decision_stage(), Some(DecisionStage::Chairman));
    }
}
