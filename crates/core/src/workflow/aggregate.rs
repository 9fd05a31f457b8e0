//! Expense status aggregation over approval steps.

use crate::workflow::types::{ApprovalStep, ExpenseStatus, StepStatus};

/// Derives the expense status from its steps.
pub struct StatusAggregator;

impl StatusAggregator {
    /// Recomputes the expense status.
    ///
    /// 1. Any rejected step yields `Rejected`.
    /// 2. Otherwise, no pending step left yields `Approved`.
    /// 3. Otherwise `PendingApproval`.
    ///
    /// Pure, so re-running it on an unchanged step set is idempotent.
    #[must_use]
    pub fn recompute(steps: &[ApprovalStep]) -> ExpenseStatus {
        if steps.iter().any(|s| s.status == StepStatus::Rejected) {
            ExpenseStatus::Rejected
        } else if steps.iter().all(|s| s.status != StepStatus::Pending) {
            ExpenseStatus::Approved
        } else {
            ExpenseStatus::PendingApproval
        }
    }

    /// Counts `(approved, pending, rejected)` steps.
    #[must_use]
    pub fn tally(steps: &[ApprovalStep]) -> (usize, usize, usize) {
        steps
            .iter()
            .fold((0, 0, 0), |(a, p, r), s| match s.status {
                StepStatus::Approved => (a + 1, p, r),
                StepStatus::Pending => (a, p + 1, r),
                StepStatus::Rejected => (a, p, r + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendflow_shared::types::{EmployeeId, ExpenseId};

    fn steps(statuses: &[StepStatus]) -> Vec<ApprovalStep> {
        let expense_id = ExpenseId::new();
        statuses
            .iter()
            .zip(1..)
            .map(|(status, seq)| ApprovalStep {
                status: *status,
                ..ApprovalStep::pending(expense_id, EmployeeId::new(), seq)
            })
            .collect()
    }

    #[test]
    fn test_rejection_short_circuits() {
        let s = steps(&[StepStatus::Approved, StepStatus::Pending, StepStatus::Rejected]);
        assert_eq!(StatusAggregator::recompute(&s), ExpenseStatus::Rejected);
    }

    #[test]
    fn test_all_approved() {
        let s = steps(&[StepStatus::Approved, StepStatus::Approved]);
        assert_eq!(StatusAggregator::recompute(&s), ExpenseStatus::Approved);
    }

    #[test]
    fn test_pending_remaining() {
        let s = steps(&[StepStatus::Approved, StepStatus::Pending]);
        assert_eq!(
            StatusAggregator::recompute(&s),
            ExpenseStatus::PendingApproval
        );
    }

    #[test]
    fn test_tally() {
        let s = steps(&[
            StepStatus::Approved,
            StepStatus::Pending,
            StepStatus::Pending,
            StepStatus::Rejected,
        ]);
        assert_eq!(StatusAggregator::tally(&s), (1, 2, 1));
    }
}
