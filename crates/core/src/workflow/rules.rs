//! Amount-banded approval rules.
//!
//! A rule applies to every expense whose company-currency amount falls in
//! `[min_amount, max_amount]` (upper bound optional). More than one rule may
//! match; all matches apply in ascending `sequence`.

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spendflow_shared::types::money::MINOR_UNIT_SCALE;
use spendflow_shared::types::{ApprovalRuleId, EmployeeId};

use crate::workflow::error::WorkflowError;

/// Discriminant of an approval rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRuleKind {
    /// One named approver.
    SpecificApprover,
    /// A list of approvers sharing one tier.
    Percentage,
    /// A list of approvers sharing one tier, threshold optional.
    Hybrid,
}

impl ApprovalRuleKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpecificApprover => "specific_approver",
            Self::Percentage => "percentage",
            Self::Hybrid => "hybrid",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "specific_approver" => Some(Self::SpecificApprover),
            "percentage" => Some(Self::Percentage),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured approver of a list-based rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleApprover {
    /// The approver.
    pub approver_id: EmployeeId,
    /// Display order within the rule.
    pub sequence: i32,
}

/// Kind-specific payload of an approval rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePolicy {
    /// Route to exactly one approver.
    SpecificApprover {
        /// The approver.
        approver_id: EmployeeId,
    },
    /// Route to every listed approver.
    ///
    /// `percentage_required` is recorded but every approver is mandatory.
    Percentage {
        /// Configured approvers.
        approvers: Vec<RuleApprover>,
        /// Declared quorum, 1..=100.
        percentage_required: u8,
    },
    /// Route to every listed approver, with an optional declared quorum.
    Hybrid {
        /// Configured approvers.
        approvers: Vec<RuleApprover>,
        /// Declared quorum, 1..=100 when present.
        percentage_required: Option<u8>,
    },
}

impl RulePolicy {
    /// Returns the discriminant.
    #[must_use]
    pub fn kind(&self) -> ApprovalRuleKind {
        match self {
            Self::SpecificApprover { .. } => ApprovalRuleKind::SpecificApprover,
            Self::Percentage { .. } => ApprovalRuleKind::Percentage,
            Self::Hybrid { .. } => ApprovalRuleKind::Hybrid,
        }
    }

    /// Returns the approvers this policy routes to, ordered by their
    /// configured sequence.
    #[must_use]
    pub fn approver_ids(&self) -> Vec<EmployeeId> {
        match self {
            Self::SpecificApprover { approver_id } => vec![*approver_id],
            Self::Percentage { approvers, .. } | Self::Hybrid { approvers, .. } => {
                let mut ordered = approvers.clone();
                ordered.sort_by_key(|a| a.sequence);
                ordered.into_iter().map(|a| a.approver_id).collect()
            }
        }
    }

    /// Returns the declared quorum, if any.
    #[must_use]
    pub fn percentage_required(&self) -> Option<u8> {
        match self {
            Self::SpecificApprover { .. } => None,
            Self::Percentage {
                percentage_required,
                ..
            } => Some(*percentage_required),
            Self::Hybrid {
                percentage_required,
                ..
            } => *percentage_required,
        }
    }
}

/// A company's approval rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier for the rule.
    pub id: ApprovalRuleId,
    /// Human-readable name for the rule.
    pub name: String,
    /// Lower bound of the band, inclusive.
    pub min_amount: Decimal,
    /// Upper bound of the band, inclusive; `None` is unbounded.
    pub max_amount: Option<Decimal>,
    /// Position among the company's rules.
    pub sequence: i32,
    /// Inactive rules never match.
    pub is_active: bool,
    /// Who the rule routes to.
    pub policy: RulePolicy,
}

/// Stateless engine for selecting and validating approval rules.
pub struct RuleEngine;

impl RuleEngine {
    /// Returns true if `rule` is active and `amount` lies in its band.
    #[must_use]
    pub fn matches(rule: &ApprovalRule, amount: Decimal) -> bool {
        rule.is_active
            && amount >= rule.min_amount
            && rule.max_amount.is_none_or(|max| amount <= max)
    }

    /// Returns the rules matching `amount`, ascending by sequence.
    ///
    /// Rules sharing a sequence keep their input order.
    #[must_use]
    pub fn matching_rules(rules: &[ApprovalRule], amount: Decimal) -> Vec<&ApprovalRule> {
        let mut matched: Vec<_> = rules.iter().filter(|r| Self::matches(r, amount)).collect();
        matched.sort_by_key(|r| r.sequence);
        matched
    }

    /// Checks a rule definition before it is stored.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidRule` describing the first problem found.
    pub fn validate(rule: &ApprovalRule) -> Result<(), WorkflowError> {
        if rule.name.trim().is_empty() {
            return Err(WorkflowError::InvalidRule("name must not be empty".into()));
        }
        if rule.min_amount.is_sign_negative() && !rule.min_amount.is_zero() {
            return Err(WorkflowError::InvalidRule(
                "min_amount must not be negative".into(),
            ));
        }
        for bound in std::iter::once(rule.min_amount).chain(rule.max_amount) {
            if bound.normalize().scale() > MINOR_UNIT_SCALE {
                return Err(WorkflowError::InvalidRule(format!(
                    "band bound {bound} has more than {MINOR_UNIT_SCALE} decimal places"
                )));
            }
        }
        if let Some(max) = rule.max_amount {
            if max < rule.min_amount {
                return Err(WorkflowError::InvalidRule(format!(
                    "max_amount {max} is below min_amount {}",
                    rule.min_amount
                )));
            }
        }
        if let Some(pct) = rule.policy.percentage_required() {
            if !(1..=100).contains(&pct) {
                return Err(WorkflowError::InvalidRule(format!(
                    "percentage_required must be between 1 and 100, got {pct}"
                )));
            }
        }

        match &rule.policy {
            RulePolicy::SpecificApprover { .. } => Ok(()),
            RulePolicy::Percentage { approvers, .. } | RulePolicy::Hybrid { approvers, .. } => {
                if approvers.is_empty() {
                    return Err(WorkflowError::InvalidRule(format!(
                        "{} rule needs at least one approver",
                        rule.policy.kind()
                    )));
                }
                let mut seen = HashSet::new();
                for approver in approvers {
                    if !seen.insert(approver.approver_id) {
                        return Err(WorkflowError::InvalidRule(format!(
                            "approver {} listed more than once",
                            approver.approver_id
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn specific(min: Decimal, max: Option<Decimal>, sequence: i32) -> ApprovalRule {
        ApprovalRule {
            id: ApprovalRuleId::new(),
            name: format!("rule {sequence}"),
            min_amount: min,
            max_amount: max,
            sequence,
            is_active: true,
            policy: RulePolicy::SpecificApprover {
                approver_id: EmployeeId::new(),
            },
        }
    }

    fn listed(approvers: Vec<EmployeeId>, pct: u8) -> ApprovalRule {
        ApprovalRule {
            policy: RulePolicy::Percentage {
                approvers: approvers
                    .into_iter()
                    .enumerate()
                    .map(|(i, approver_id)| RuleApprover {
                        approver_id,
                        sequence: i32::try_from(i).unwrap_or(0) + 1,
                    })
                    .collect(),
                percentage_required: pct,
            },
            ..specific(dec!(0), None, 1)
        }
    }

    #[test]
    fn test_bounds_inclusive() {
        let rule = specific(dec!(100), Some(dec!(500)), 1);
        assert!(RuleEngine::matches(&rule, dec!(100)));
        assert!(RuleEngine::matches(&rule, dec!(500)));
        assert!(!RuleEngine::matches(&rule, dec!(99.99)));
        assert!(!RuleEngine::matches(&rule, dec!(500.01)));
    }

    #[test]
    fn test_unbounded_max() {
        let rule = specific(dec!(1000), None, 1);
        assert!(RuleEngine::matches(&rule, dec!(1000)));
        assert!(RuleEngine::matches(&rule, dec!(99999999)));
        assert!(!RuleEngine::matches(&rule, dec!(999)));
    }

    #[test]
    fn test_inactive_never_matches() {
        let mut rule = specific(dec!(0), None, 1);
        rule.is_active = false;
        assert!(!RuleEngine::matches(&rule, dec!(10)));
    }

    #[test]
    fn test_matching_rules_sorted_by_sequence() {
        let rules = vec![
            specific(dec!(0), None, 3),
            specific(dec!(0), Some(dec!(50)), 1),
            specific(dec!(0), None, 2),
            specific(dec!(200), None, 0),
        ];

        let matched = RuleEngine::matching_rules(&rules, dec!(100));
        let sequences: Vec<_> = matched.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![2, 3]);
    }

    #[test]
    fn test_approver_ids_ordered() {
        let a = EmployeeId::new();
        let b = EmployeeId::new();
        let policy = RulePolicy::Hybrid {
            approvers: vec![
                RuleApprover {
                    approver_id: a,
                    sequence: 2,
                },
                RuleApprover {
                    approver_id: b,
                    sequence: 1,
                },
            ],
            percentage_required: None,
        };
        assert_eq!(policy.approver_ids(), vec![b, a]);
        assert_eq!(policy.kind(), ApprovalRuleKind::Hybrid);
    }

    #[test]
    fn test_validate_ok() {
        assert!(RuleEngine::validate(&specific(dec!(0), Some(dec!(10)), 1)).is_ok());
        assert!(RuleEngine::validate(&listed(vec![EmployeeId::new()], 60)).is_ok());
    }

    #[test]
    fn test_validate_band() {
        let err = RuleEngine::validate(&specific(dec!(-1), None, 1)).unwrap_err();
        assert!(err.to_string().contains("negative"));

        let err = RuleEngine::validate(&specific(dec!(100), Some(dec!(10)), 1)).unwrap_err();
        assert!(err.to_string().contains("below min_amount"));
    }

    #[test]
    fn test_validate_band_precision() {
        let err = RuleEngine::validate(&specific(dec!(100.005), None, 1)).unwrap_err();
        assert!(err.to_string().contains("decimal places"));

        let err = RuleEngine::validate(&specific(dec!(0), Some(dec!(9.999)), 1)).unwrap_err();
        assert!(err.to_string().contains("decimal places"));

        // Trailing zeros are exact
        assert!(RuleEngine::validate(&specific(dec!(100.000), Some(dec!(250.50)), 1)).is_ok());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(RuleEngine::validate(&listed(vec![EmployeeId::new()], 0)).is_err());
        assert!(RuleEngine::validate(&listed(vec![EmployeeId::new()], 101)).is_err());
        assert!(RuleEngine::validate(&listed(vec![EmployeeId::new()], 100)).is_ok());
    }

    #[test]
    fn test_validate_approver_list() {
        assert!(RuleEngine::validate(&listed(vec![], 50)).is_err());

        let dup = EmployeeId::new();
        let err = RuleEngine::validate(&listed(vec![dup, dup], 50)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RULE");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            ApprovalRuleKind::parse("SPECIFIC_APPROVER"),
            Some(ApprovalRuleKind::SpecificApprover)
        );
        assert_eq!(ApprovalRuleKind::parse("quorum"), None);
    }
}
