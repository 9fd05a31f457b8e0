//! Property-based tests for WorkflowBuilder.

use std::collections::HashSet;

use proptest::prelude::*;
use rust_decimal::Decimal;
use spendflow_shared::types::{ApprovalRuleId, EmployeeId};

use crate::workflow::builder::{StepSource, WorkflowBuilder};
use crate::workflow::hierarchy::{HierarchyResolver, OrgChart};
use crate::workflow::rules::{ApprovalRule, RuleApprover, RuleEngine, RulePolicy};
use crate::workflow::types::ExpenseStatus;

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// A shared pool of employees that chains and rules both draw from, so
/// overlaps between them are frequent.
const POOL: usize = 8;

#[derive(Debug, Clone)]
struct RuleSpec {
    min: i64,
    width: Option<i64>,
    sequence: i32,
    approvers: Vec<usize>,
    specific: bool,
}

fn arb_rule() -> impl Strategy<Value = RuleSpec> {
    (
        0i64..5_000,
        prop::option::of(0i64..5_000),
        0i32..5,
        prop::collection::hash_set(0..POOL, 1..4),
        any::<bool>(),
    )
        .prop_map(|(min, width, sequence, approvers, specific)| RuleSpec {
            min,
            width,
            sequence,
            approvers: approvers.into_iter().collect(),
            specific,
        })
}

fn to_rule(spec: &RuleSpec, pool: &[EmployeeId]) -> ApprovalRule {
    let policy = if spec.specific {
        RulePolicy::SpecificApprover {
            approver_id: pool[spec.approvers[0]],
        }
    } else {
        RulePolicy::Hybrid {
            approvers: spec
                .approvers
                .iter()
                .zip(1..)
                .map(|(idx, sequence)| RuleApprover {
                    approver_id: pool[*idx],
                    sequence,
                })
                .collect(),
            percentage_required: None,
        }
    };
    ApprovalRule {
        id: ApprovalRuleId::new(),
        name: "generated".into(),
        min_amount: Decimal::from(spec.min),
        max_amount: spec.width.map(|w| Decimal::from(spec.min + w)),
        sequence: spec.sequence,
        is_active: true,
        policy,
    }
}

/// Chain of `depth` managers above pool member 0, drawn from the pool.
fn chart_for(depth: usize, pool: &[EmployeeId]) -> OrgChart {
    OrgChart::from_edges((0..depth).map(|i| (pool[i], Some(pool[i + 1]))))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// No approver appears twice and the submitter is never an approver.
    #[test]
    fn prop_plan_deduplicated(
        depth in 0usize..POOL,
        specs in prop::collection::vec(arb_rule(), 0..5),
        amount in arb_amount(),
    ) {
        let pool: Vec<EmployeeId> = (0..POOL).map(|_| EmployeeId::new()).collect();
        let chart = chart_for(depth, &pool);
        let rules: Vec<_> = specs.iter().map(|s| to_rule(s, &pool)).collect();

        let plan = WorkflowBuilder::build(&chart, &rules, pool[0], amount, false);

        let approvers: HashSet<_> = plan.steps.iter().map(|s| s.approver_id).collect();
        prop_assert_eq!(approvers.len(), plan.steps.len());
        prop_assert!(!approvers.contains(&pool[0]));
    }

    /// Sequences start at 1 and never decrease in creation order.
    #[test]
    fn prop_sequences_monotonic(
        depth in 0usize..POOL,
        specs in prop::collection::vec(arb_rule(), 0..5),
        amount in arb_amount(),
    ) {
        let pool: Vec<EmployeeId> = (0..POOL).map(|_| EmployeeId::new()).collect();
        let chart = chart_for(depth, &pool);
        let rules: Vec<_> = specs.iter().map(|s| to_rule(s, &pool)).collect();

        let plan = WorkflowBuilder::build(&chart, &rules, pool[0], amount, false);

        if let Some(first) = plan.steps.first() {
            prop_assert_eq!(first.sequence, 1);
        }
        for pair in plan.steps.windows(2) {
            prop_assert!(pair[0].sequence <= pair[1].sequence);
        }
    }

    /// The chain comes first, one tier per manager, nearest first.
    #[test]
    fn prop_chain_prefix(
        depth in 0usize..POOL,
        specs in prop::collection::vec(arb_rule(), 0..5),
        amount in arb_amount(),
    ) {
        let pool: Vec<EmployeeId> = (0..POOL).map(|_| EmployeeId::new()).collect();
        let chart = chart_for(depth, &pool);
        let rules: Vec<_> = specs.iter().map(|s| to_rule(s, &pool)).collect();

        let plan = WorkflowBuilder::build(&chart, &rules, pool[0], amount, false);
        let chain = HierarchyResolver::ancestors(&chart, pool[0]);

        prop_assert!(plan.steps.len() >= chain.len());
        for (idx, manager) in chain.iter().enumerate() {
            let step = &plan.steps[idx];
            prop_assert_eq!(step.approver_id, *manager);
            prop_assert_eq!(step.sequence, i32::try_from(idx).unwrap() + 1);
            prop_assert_eq!(step.source, StepSource::ManagementChain { level: idx + 1 });
        }
        for step in &plan.steps[chain.len()..] {
            prop_assert!(matches!(step.source, StepSource::Rule { .. }), "rule steps follow the chain");
        }
    }

    /// Steps exist iff the chain or a matched rule contributes a new approver.
    #[test]
    fn prop_status_reflects_steps(
        depth in 0usize..POOL,
        specs in prop::collection::vec(arb_rule(), 0..5),
        amount in arb_amount(),
    ) {
        let pool: Vec<EmployeeId> = (0..POOL).map(|_| EmployeeId::new()).collect();
        let chart = chart_for(depth, &pool);
        let rules: Vec<_> = specs.iter().map(|s| to_rule(s, &pool)).collect();

        let plan = WorkflowBuilder::build(&chart, &rules, pool[0], amount, false);

        let mut expected: HashSet<EmployeeId> =
            HierarchyResolver::ancestors(&chart, pool[0]).into_iter().collect();
        for rule in RuleEngine::matching_rules(&rules, amount) {
            expected.extend(rule.policy.approver_ids());
        }
        expected.remove(&pool[0]);

        let planned: HashSet<EmployeeId> = plan.steps.iter().map(|s| s.approver_id).collect();
        prop_assert_eq!(&planned, &expected);

        if plan.steps.is_empty() {
            prop_assert_eq!(plan.status, ExpenseStatus::Submitted);
        } else {
            prop_assert_eq!(plan.status, ExpenseStatus::PendingApproval);
        }
    }
}
