//! Sequential gating of approval steps.

use crate::workflow::types::{ApprovalStep, StepStatus};

/// Decides which steps of an expense can be acted on right now.
///
/// A step is actionable once every step of the same expense with a strictly
/// smaller sequence is approved. Steps of the same sequence form a co-equal
/// tier and never block one another. Readiness is derived on demand and
/// never stored.
pub struct SequentialGate;

impl SequentialGate {
    /// Returns true if `step` is unblocked by earlier tiers.
    ///
    /// `steps` is the full step set of the expense; steps of other expenses
    /// are ignored. The step's own status is not considered.
    #[must_use]
    pub fn is_actionable(step: &ApprovalStep, steps: &[ApprovalStep]) -> bool {
        steps
            .iter()
            .filter(|other| other.expense_id == step.expense_id && other.sequence < step.sequence)
            .all(|other| other.status == StepStatus::Approved)
    }

    /// Returns the pending steps that are currently actionable.
    #[must_use]
    pub fn actionable_steps(steps: &[ApprovalStep]) -> Vec<&ApprovalStep> {
        steps
            .iter()
            .filter(|s| s.status == StepStatus::Pending && Self::is_actionable(s, steps))
            .collect()
    }

    /// Returns the lowest sequence that still has a pending step.
    #[must_use]
    pub fn current_tier(steps: &[ApprovalStep]) -> Option<i32> {
        steps
            .iter()
            .filter(|s| s.status == StepStatus::Pending)
            .map(|s| s.sequence)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendflow_shared::types::{EmployeeId, ExpenseId};

    fn plan(expense_id: ExpenseId, sequences: &[i32]) -> Vec<ApprovalStep> {
        sequences
            .iter()
            .map(|seq| ApprovalStep::pending(expense_id, EmployeeId::new(), *seq))
            .collect()
    }

    #[test]
    fn test_first_tier_always_actionable() {
        let steps = plan(ExpenseId::new(), &[1, 1, 2]);
        assert!(SequentialGate::is_actionable(&steps[0], &steps));
        assert!(SequentialGate::is_actionable(&steps[1], &steps));
        assert!(!SequentialGate::is_actionable(&steps[2], &steps));
    }

    #[test]
    fn test_later_tier_waits_for_whole_tier() {
        let mut steps = plan(ExpenseId::new(), &[1, 1, 2]);
        steps[0].status = StepStatus::Approved;
        assert!(!SequentialGate::is_actionable(&steps[2], &steps));

        steps[1].status = StepStatus::Approved;
        assert!(SequentialGate::is_actionable(&steps[2], &steps));
    }

    #[test]
    fn test_rejection_does_not_unblock() {
        let mut steps = plan(ExpenseId::new(), &[1, 2]);
        steps[0].status = StepStatus::Rejected;
        assert!(!SequentialGate::is_actionable(&steps[1], &steps));
    }

    #[test]
    fn test_other_expenses_ignored() {
        let mut steps = plan(ExpenseId::new(), &[2]);
        steps.extend(plan(ExpenseId::new(), &[1]));
        assert!(SequentialGate::is_actionable(&steps[0], &steps));
    }

    #[test]
    fn test_gaps_are_harmless() {
        let mut steps = plan(ExpenseId::new(), &[1, 3]);
        steps[0].status = StepStatus::Approved;
        assert!(SequentialGate::is_actionable(&steps[1], &steps));
    }

    #[test]
    fn test_actionable_steps_and_tier() {
        let mut steps = plan(ExpenseId::new(), &[1, 2, 2, 3]);
        assert_eq!(SequentialGate::current_tier(&steps), Some(1));
        assert_eq!(SequentialGate::actionable_steps(&steps).len(), 1);

        steps[0].status = StepStatus::Approved;
        assert_eq!(SequentialGate::current_tier(&steps), Some(2));
        let ready = SequentialGate::actionable_steps(&steps);
        assert_eq!(ready.len(), 2);
        assert!(ready.iter().all(|s| s.sequence == 2));

        for step in &mut steps {
            step.status = StepStatus::Approved;
        }
        assert_eq!(SequentialGate::current_tier(&steps), None);
        assert!(SequentialGate::actionable_steps(&steps).is_empty());
    }
}
