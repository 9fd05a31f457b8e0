//! Property-based tests for SequentialGate and StatusAggregator.

use proptest::prelude::*;
use spendflow_shared::types::{EmployeeId, ExpenseId};

use crate::workflow::aggregate::StatusAggregator;
use crate::workflow::gate::SequentialGate;
use crate::workflow::types::{ApprovalStep, ExpenseStatus, StepStatus};

/// Strategy for generating random StepStatus values.
fn arb_step_status() -> impl Strategy<Value = StepStatus> {
    prop_oneof![
        Just(StepStatus::Pending),
        Just(StepStatus::Approved),
        Just(StepStatus::Rejected),
    ]
}

/// Strategy for a non-empty step set of one expense with sorted sequences.
fn arb_steps() -> impl Strategy<Value = Vec<ApprovalStep>> {
    prop::collection::vec((1i32..6, arb_step_status()), 1..12).prop_map(|mut raw| {
        raw.sort_by_key(|(seq, _)| *seq);
        let expense_id = ExpenseId::new();
        raw.into_iter()
            .map(|(sequence, status)| ApprovalStep {
                status,
                ..ApprovalStep::pending(expense_id, EmployeeId::new(), sequence)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Gate
    // =========================================================================

    /// The lowest tier is always actionable.
    #[test]
    fn prop_lowest_tier_actionable(steps in arb_steps()) {
        let lowest = steps.iter().map(|s| s.sequence).min().unwrap();
        for step in steps.iter().filter(|s| s.sequence == lowest) {
            prop_assert!(SequentialGate::is_actionable(step, &steps));
        }
    }

    /// Actionable iff every strictly earlier step is approved.
    #[test]
    fn prop_gate_matches_definition(steps in arb_steps()) {
        for step in &steps {
            let expected = steps
                .iter()
                .filter(|o| o.sequence < step.sequence)
                .all(|o| o.status == StepStatus::Approved);
            prop_assert_eq!(SequentialGate::is_actionable(step, &steps), expected);
        }
    }

    /// Steps in the same tier share actionability.
    #[test]
    fn prop_tier_members_agree(steps in arb_steps()) {
        for a in &steps {
            for b in steps.iter().filter(|b| b.sequence == a.sequence) {
                prop_assert_eq!(
                    SequentialGate::is_actionable(a, &steps),
                    SequentialGate::is_actionable(b, &steps)
                );
            }
        }
    }

    // =========================================================================
    // Aggregator
    // =========================================================================

    /// Any rejection yields Rejected regardless of the rest.
    #[test]
    fn prop_rejection_wins(mut steps in arb_steps(), idx in any::<prop::sample::Index>()) {
        let i = idx.index(steps.len());
        steps[i].status = StepStatus::Rejected;
        prop_assert_eq!(StatusAggregator::recompute(&steps), ExpenseStatus::Rejected);
    }

    /// Without rejections the status is Approved iff nothing is pending.
    #[test]
    fn prop_pending_or_approved(mut steps in arb_steps()) {
        for step in &mut steps {
            if step.status == StepStatus::Rejected {
                step.status = StepStatus::Approved;
            }
        }
        let any_pending = steps.iter().any(|s| s.status == StepStatus::Pending);
        let expected = if any_pending {
            ExpenseStatus::PendingApproval
        } else {
            ExpenseStatus::Approved
        };
        prop_assert_eq!(StatusAggregator::recompute(&steps), expected);
    }

    /// Recomputing on an unchanged set is idempotent.
    #[test]
    fn prop_recompute_idempotent(steps in arb_steps()) {
        let first = StatusAggregator::recompute(&steps);
        let second = StatusAggregator::recompute(&steps);
        prop_assert_eq!(first, second);
    }

    /// The aggregate result never depends on step order.
    #[test]
    fn prop_recompute_order_independent(steps in arb_steps()) {
        let mut reversed = steps.clone();
        reversed.reverse();
        prop_assert_eq!(
            StatusAggregator::recompute(&steps),
            StatusAggregator::recompute(&reversed)
        );
    }
}
