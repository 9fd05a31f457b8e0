//! Workflow service for expense state transitions.
//!
//! This module validates submit, approve, reject and payout requests and
//! returns the resulting `WorkflowAction` with its audit data. Persisting
//! the action is the storage layer's job.

use chrono::Utc;
use spendflow_shared::types::EmployeeId;

use crate::workflow::aggregate::StatusAggregator;
use crate::workflow::error::WorkflowError;
use crate::workflow::gate::SequentialGate;
use crate::workflow::types::{ApprovalStep, ExpenseStatus, StepDecision, WorkflowAction};

/// Stateless service for managing expense workflow transitions.
///
/// The acting employee is always passed in explicitly.
pub struct WorkflowService;

impl WorkflowService {
    /// Submit a draft expense.
    ///
    /// # Arguments
    /// * `current_status` - The current status of the expense
    /// * `owner` - The employee who owns the expense
    /// * `actor` - The employee submitting it
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::Submit)` if the transition is valid
    /// * `Err(WorkflowError::NotExpenseOwner)` if `actor` is not the owner
    /// * `Err(WorkflowError::InvalidTransition)` if not in Draft status
    pub fn submit(
        current_status: ExpenseStatus,
        owner: EmployeeId,
        actor: EmployeeId,
    ) -> Result<WorkflowAction, WorkflowError> {
        if owner != actor {
            return Err(WorkflowError::NotExpenseOwner {
                user_id: actor.into_inner(),
            });
        }

        match current_status {
            ExpenseStatus::Draft => Ok(WorkflowAction::Submit {
                new_status: ExpenseStatus::Submitted,
                submitted_by: actor,
                submitted_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ExpenseStatus::Submitted,
            }),
        }
    }

    /// Approve or reject one step of an expense.
    ///
    /// The returned action carries the expense status recomputed as if the
    /// decision had already been written.
    ///
    /// # Arguments
    /// * `expense_status` - The current status of the expense
    /// * `step` - The step being decided
    /// * `steps` - Every step of the expense, `step` included
    /// * `actor` - The employee acting
    /// * `decision` - Approve or reject
    /// * `comment` - Optional comment from the approver
    ///
    /// # Errors
    /// * `InvalidTransition` if the expense is not awaiting approval
    /// * `NotAssignedApprover` if `actor` is not the step's approver
    /// * `StepAlreadyResolved` if the step was already decided
    /// * `StepNotActionable` if an earlier tier is not fully approved
    pub fn decide(
        expense_status: ExpenseStatus,
        step: &ApprovalStep,
        steps: &[ApprovalStep],
        actor: EmployeeId,
        decision: StepDecision,
        comment: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        if !expense_status.accepts_decisions() {
            return Err(WorkflowError::InvalidTransition {
                from: expense_status,
                to: match decision {
                    StepDecision::Approve => ExpenseStatus::Approved,
                    StepDecision::Reject => ExpenseStatus::Rejected,
                },
            });
        }
        if step.approver_id != actor {
            return Err(WorkflowError::NotAssignedApprover {
                user_id: actor.into_inner(),
            });
        }
        if step.status.is_resolved() {
            return Err(WorkflowError::StepAlreadyResolved {
                step_id: step.id.into_inner(),
                status: step.status,
            });
        }
        if !SequentialGate::is_actionable(step, steps) {
            return Err(WorkflowError::StepNotActionable {
                step_id: step.id.into_inner(),
                sequence: step.sequence,
            });
        }

        let decided: Vec<ApprovalStep> = steps
            .iter()
            .map(|s| {
                if s.id == step.id {
                    ApprovalStep {
                        status: decision.resulting_status(),
                        ..s.clone()
                    }
                } else {
                    s.clone()
                }
            })
            .collect();
        let new_status = StatusAggregator::recompute(&decided);
        let now = Utc::now();

        Ok(match decision {
            StepDecision::Approve => WorkflowAction::Approve {
                step_id: step.id,
                new_status,
                approved_by: actor,
                approved_at: now,
                comment,
            },
            StepDecision::Reject => WorkflowAction::Reject {
                step_id: step.id,
                new_status,
                rejected_by: actor,
                rejected_at: now,
                comment,
            },
        })
    }

    /// Record payout of an approved expense.
    ///
    /// # Returns
    /// * `Ok(WorkflowAction::MarkPaid)` if the transition is valid
    /// * `Err(WorkflowError::InvalidTransition)` if not in Approved status
    pub fn mark_paid(
        current_status: ExpenseStatus,
        paid_by: EmployeeId,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            ExpenseStatus::Approved => Ok(WorkflowAction::MarkPaid {
                new_status: ExpenseStatus::Paid,
                paid_by,
                paid_at: Utc::now(),
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ExpenseStatus::Paid,
            }),
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → Submitted (submit)
    /// - Submitted → PendingApproval | Approved (plan attached / auto-approve)
    /// - PendingApproval → Approved | Rejected (aggregation)
    /// - Approved → Paid (payout)
    #[must_use]
    pub fn is_valid_transition(from: ExpenseStatus, to: ExpenseStatus) -> bool {
        matches!(
            (from, to),
            (ExpenseStatus::Draft, ExpenseStatus::Submitted)
                | (
                    ExpenseStatus::Submitted,
                    ExpenseStatus::PendingApproval | ExpenseStatus::Approved
                )
                | (
                    ExpenseStatus::PendingApproval,
                    ExpenseStatus::Approved | ExpenseStatus::Rejected
                )
                | (ExpenseStatus::Approved, ExpenseStatus::Paid)
        )
    }
}
