//! Approval plan construction.
//!
//! An expense's plan is its owner's management chain (one tier per manager,
//! nearest first) followed by one tier per matched rule. An approver is
//! never planned twice for the same expense.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;
use spendflow_shared::EmptyWorkflowPolicy;
use spendflow_shared::types::{ApprovalRuleId, EmployeeId, ExpenseId};

use crate::workflow::error::WorkflowError;
use crate::workflow::hierarchy::{HierarchyResolver, OrgChart};
use crate::workflow::rules::{ApprovalRule, RuleEngine};
use crate::workflow::types::ExpenseStatus;

/// Why a step was planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum StepSource {
    /// The approver is the owner's manager at `level` (1 = direct).
    ManagementChain {
        /// Distance from the owner.
        level: usize,
    },
    /// The approver was added by a matched rule.
    Rule {
        /// The matched rule.
        rule_id: ApprovalRuleId,
    },
}

/// A step to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// Who must act.
    pub approver_id: EmployeeId,
    /// Gating tier, 1-based.
    pub sequence: i32,
    /// Why this approver was chosen.
    pub source: StepSource,
}

/// Result of planning an expense's approval path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowPlan {
    /// Steps in creation order; sequences are non-decreasing.
    pub steps: Vec<PlannedStep>,
    /// `PendingApproval` when at least one step exists, `Submitted` otherwise.
    pub status: ExpenseStatus,
}

impl WorkflowPlan {
    /// Returns true if no step was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Resolves the status of a stepless plan according to `policy`.
    ///
    /// Plans with steps are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NoApprovalPath` for an empty plan under
    /// `EmptyWorkflowPolicy::Fail`.
    pub fn apply_empty_policy(
        mut self,
        policy: EmptyWorkflowPolicy,
        expense_id: ExpenseId,
    ) -> Result<Self, WorkflowError> {
        if !self.is_empty() {
            return Ok(self);
        }
        self.status = match policy {
            EmptyWorkflowPolicy::Fail => {
                return Err(WorkflowError::NoApprovalPath {
                    expense_id: expense_id.into_inner(),
                });
            }
            EmptyWorkflowPolicy::AutoApprove => ExpenseStatus::Approved,
            EmptyWorkflowPolicy::LeaveSubmitted => ExpenseStatus::Submitted,
        };
        Ok(self)
    }
}

/// Stateless builder for approval plans.
pub struct WorkflowBuilder;

impl WorkflowBuilder {
    /// Plans the approval steps for an expense.
    ///
    /// # Arguments
    /// * `chart` - The company's manager relationships
    /// * `rules` - The company's rules; inactive ones are ignored
    /// * `submitter` - The expense owner
    /// * `amount` - The amount in company currency
    /// * `allow_self_approval` - Whether a rule may route back to the owner
    #[must_use]
    pub fn build(
        chart: &OrgChart,
        rules: &[ApprovalRule],
        submitter: EmployeeId,
        amount: Decimal,
        allow_self_approval: bool,
    ) -> WorkflowPlan {
        let mut steps = Vec::new();
        let mut used = HashSet::new();
        if !allow_self_approval {
            used.insert(submitter);
        }

        let mut sequence = 1;
        for (idx, manager) in HierarchyResolver::ancestors(chart, submitter)
            .into_iter()
            .enumerate()
        {
            used.insert(manager);
            steps.push(PlannedStep {
                approver_id: manager,
                sequence,
                source: StepSource::ManagementChain { level: idx + 1 },
            });
            sequence += 1;
        }

        for rule in RuleEngine::matching_rules(rules, amount) {
            for approver_id in rule.policy.approver_ids() {
                if used.insert(approver_id) {
                    steps.push(PlannedStep {
                        approver_id,
                        sequence,
                        source: StepSource::Rule { rule_id: rule.id },
                    });
                }
            }
            // Advances even when every approver was already planned.
            sequence += 1;
        }

        let status = if steps.is_empty() {
            ExpenseStatus::Submitted
        } else {
            ExpenseStatus::PendingApproval
        };

        WorkflowPlan { steps, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::rules::{RulePolicy, RuleApprover};
    use rust_decimal_macros::dec;

    fn chain(n: usize) -> (OrgChart, Vec<EmployeeId>) {
        let ids: Vec<EmployeeId> = (0..=n).map(|_| EmployeeId::new()).collect();
        let chart = OrgChart::from_edges(ids.windows(2).map(|w| (w[0], Some(w[1]))));
        (chart, ids)
    }

    fn percentage_rule(min: Decimal, sequence: i32, approvers: &[EmployeeId]) -> ApprovalRule {
        ApprovalRule {
            id: ApprovalRuleId::new(),
            name: "finance".into(),
            min_amount: min,
            max_amount: None,
            sequence,
            is_active: true,
            policy: RulePolicy::Percentage {
                approvers: approvers
                    .iter()
                    .zip(1..)
                    .map(|(id, seq)| RuleApprover {
                        approver_id: *id,
                        sequence: seq,
                    })
                    .collect(),
                percentage_required: 50,
            },
        }
    }

    fn specific_rule(min: Decimal, sequence: i32, approver_id: EmployeeId) -> ApprovalRule {
        ApprovalRule {
            policy: RulePolicy::SpecificApprover { approver_id },
            ..percentage_rule(min, sequence, &[])
        }
    }

    #[test]
    fn test_three_level_chain_no_rules() {
        let (chart, ids) = chain(3);
        let plan = WorkflowBuilder::build(&chart, &[], ids[0], dec!(10), false);

        assert_eq!(plan.status, ExpenseStatus::PendingApproval);
        let approvers: Vec<_> = plan.steps.iter().map(|s| s.approver_id).collect();
        let sequences: Vec<_> = plan.steps.iter().map(|s| s.sequence).collect();
        assert_eq!(approvers, vec![ids[1], ids[2], ids[3]]);
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(
            plan.steps[2].source,
            StepSource::ManagementChain { level: 3 }
        );
    }

    #[test]
    fn test_percentage_rule_shares_one_tier() {
        let (chart, ids) = chain(2);
        let finance = [EmployeeId::new(), EmployeeId::new()];
        let rules = vec![percentage_rule(dec!(100), 1, &finance)];

        let plan = WorkflowBuilder::build(&chart, &rules, ids[0], dec!(500), false);

        assert_eq!(plan.steps.len(), 4);
        assert_eq!(plan.steps[2].approver_id, finance[0]);
        assert_eq!(plan.steps[3].approver_id, finance[1]);
        assert_eq!(plan.steps[2].sequence, 3);
        assert_eq!(plan.steps[3].sequence, 3);
    }

    #[test]
    fn test_rule_approver_in_chain_is_skipped() {
        let (chart, ids) = chain(2);
        let rules = vec![
            specific_rule(dec!(0), 1, ids[2]),
            specific_rule(dec!(0), 2, EmployeeId::new()),
        ];

        let plan = WorkflowBuilder::build(&chart, &rules, ids[0], dec!(10), false);

        assert_eq!(plan.steps.len(), 3);
        // First rule consumed sequence 3 without producing a step.
        assert_eq!(plan.steps[2].sequence, 4);
    }

    #[test]
    fn test_self_approval_guard() {
        let (chart, ids) = chain(1);
        let rules = vec![specific_rule(dec!(0), 1, ids[0])];

        let plan = WorkflowBuilder::build(&chart, &rules, ids[0], dec!(10), false);
        assert_eq!(plan.steps.len(), 1);

        let plan = WorkflowBuilder::build(&chart, &rules, ids[0], dec!(10), true);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].approver_id, ids[0]);
    }

    #[test]
    fn test_rules_outside_band_ignored() {
        let (chart, ids) = chain(0);
        let rules = vec![percentage_rule(dec!(1000), 1, &[EmployeeId::new()])];

        let plan = WorkflowBuilder::build(&chart, &rules, ids[0], dec!(999.99), false);
        assert!(plan.is_empty());
        assert_eq!(plan.status, ExpenseStatus::Submitted);
    }

    #[test]
    fn test_empty_policy() {
        let (chart, ids) = chain(0);
        let expense_id = ExpenseId::new();
        let plan = WorkflowBuilder::build(&chart, &[], ids[0], dec!(1), false);

        let err = plan
            .clone()
            .apply_empty_policy(EmptyWorkflowPolicy::Fail, expense_id)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoApprovalPath { .. }));

        let approved = plan
            .clone()
            .apply_empty_policy(EmptyWorkflowPolicy::AutoApprove, expense_id)
            .unwrap();
        assert_eq!(approved.status, ExpenseStatus::Approved);

        let left = plan
            .apply_empty_policy(EmptyWorkflowPolicy::LeaveSubmitted, expense_id)
            .unwrap();
        assert_eq!(left.status, ExpenseStatus::Submitted);
    }

    #[test]
    fn test_empty_policy_ignored_when_steps_exist() {
        let (chart, ids) = chain(1);
        let plan = WorkflowBuilder::build(&chart, &[], ids[0], dec!(1), false)
            .apply_empty_policy(EmptyWorkflowPolicy::Fail, ExpenseId::new())
            .unwrap();
        assert_eq!(plan.status, ExpenseStatus::PendingApproval);
    }
}
