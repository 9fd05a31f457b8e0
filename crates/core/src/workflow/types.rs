//! Workflow domain types for expense approval.
//!
//! This module defines the statuses an expense and its approval steps move
//! through, and the audit-carrying actions produced by `WorkflowService`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendflow_shared::types::{ApprovalStepId, EmployeeId, ExpenseId};
use std::fmt;

/// Expense status in the approval workflow.
///
/// The valid transitions are:
/// - Draft → Submitted (submit)
/// - Submitted → PendingApproval (workflow built with at least one step)
/// - Submitted → Approved (empty workflow, auto-approve policy)
/// - PendingApproval → Approved | Rejected (status aggregation)
/// - Approved → Paid (external payout)
///
/// `Rejected` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    /// Being edited by its owner.
    Draft,
    /// Handed in; the approval plan has not been attached yet.
    Submitted,
    /// At least one approval step is still pending.
    PendingApproval,
    /// Every step approved.
    Approved,
    /// Some step rejected.
    Rejected,
    /// Reimbursed.
    Paid,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "pending_approval" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Returns true if no further transition can leave this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Paid)
    }

    /// Returns true if approval steps on the expense may still be decided.
    #[must_use]
    pub fn accepts_decisions(&self) -> bool {
        matches!(self, Self::PendingApproval)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Waiting for the approver.
    Pending,
    /// Signed off.
    Approved,
    /// Turned down.
    Rejected,
}

impl StepStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once the approver has acted.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of an employee within their company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    /// Company administrator; sees every expense of the company.
    Admin,
    /// People manager; sees the expenses of their whole subtree.
    Manager,
    /// Regular employee; sees only their own expenses.
    Employee,
}

impl EmployeeRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two things an approver can do with a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDecision {
    /// Sign off.
    Approve,
    /// Turn down; rejects the whole expense.
    Reject,
}

impl StepDecision {
    /// Returns the step status this decision produces.
    #[must_use]
    pub fn resulting_status(self) -> StepStatus {
        match self {
            Self::Approve => StepStatus::Approved,
            Self::Reject => StepStatus::Rejected,
        }
    }
}

/// One unit of required sign-off on an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// Unique identifier for the step.
    pub id: ApprovalStepId,
    /// The expense this step belongs to.
    pub expense_id: ExpenseId,
    /// The employee who must act on this step.
    pub approver_id: EmployeeId,
    /// Gating tier, 1-based. Equal values form a co-equal tier.
    pub sequence: i32,
    /// Current outcome.
    pub status: StepStatus,
    /// Optional comment left with the decision.
    pub comment: Option<String>,
    /// When the decision was made.
    pub decided_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    /// Creates a fresh pending step.
    #[must_use]
    pub fn pending(expense_id: ExpenseId, approver_id: EmployeeId, sequence: i32) -> Self {
        Self {
            id: ApprovalStepId::new(),
            expense_id,
            approver_id,
            sequence,
            status: StepStatus::Pending,
            comment: None,
            decided_at: None,
        }
    }
}

/// Workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Submit a draft expense.
    Submit {
        /// The new status after submission.
        new_status: ExpenseStatus,
        /// The employee who submitted the expense.
        submitted_by: EmployeeId,
        /// When the expense was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Approve one step.
    Approve {
        /// The step being approved.
        step_id: ApprovalStepId,
        /// The expense status after re-aggregation.
        new_status: ExpenseStatus,
        /// The approver.
        approved_by: EmployeeId,
        /// When the step was approved.
        approved_at: DateTime<Utc>,
        /// Optional comment from the approver.
        comment: Option<String>,
    },
    /// Reject one step (and with it the expense).
    Reject {
        /// The step being rejected.
        step_id: ApprovalStepId,
        /// The expense status after re-aggregation (always `Rejected`).
        new_status: ExpenseStatus,
        /// The approver.
        rejected_by: EmployeeId,
        /// When the step was rejected.
        rejected_at: DateTime<Utc>,
        /// Optional comment from the approver.
        comment: Option<String>,
    },
    /// Record payout of an approved expense.
    MarkPaid {
        /// The new status after payout.
        new_status: ExpenseStatus,
        /// Who recorded the payout.
        paid_by: EmployeeId,
        /// When the payout was recorded.
        paid_at: DateTime<Utc>,
    },
}

impl WorkflowAction {
    /// Returns the expense status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> ExpenseStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::MarkPaid { new_status, .. } => *new_status,
        }
    }

    /// Returns the step decided by this action, if any.
    #[must_use]
    pub fn step_id(&self) -> Option<ApprovalStepId> {
        match self {
            Self::Approve { step_id, .. } | Self::Reject { step_id, .. } => Some(*step_id),
            Self::Submit { .. } | Self::MarkPaid { .. } => None,
        }
    }

    /// Returns the step status written by this action, if any.
    #[must_use]
    pub fn step_status(&self) -> Option<StepStatus> {
        match self {
            Self::Approve { .. } => Some(StepStatus::Approved),
            Self::Reject { .. } => Some(StepStatus::Rejected),
            Self::Submit { .. } | Self::MarkPaid { .. } => None,
        }
    }
}
