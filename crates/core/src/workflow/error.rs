//! Workflow error types for expense approval.
//!
//! This module defines all error types that can occur while building an
//! approval plan, deciding steps, or moving an expense between statuses.

use spendflow_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::{ExpenseStatus, StepStatus};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ExpenseStatus,
        /// The attempted target status.
        to: ExpenseStatus,
    },

    /// Expense not found.
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// Approval step not found.
    #[error("Approval step {0} not found")]
    StepNotFound(Uuid),

    /// Employee not found.
    #[error("Employee {0} not found")]
    EmployeeNotFound(Uuid),

    /// Company not found.
    #[error("Company {0} not found")]
    CompanyNotFound(Uuid),

    /// Expense category not found.
    #[error("Expense category {0} not found")]
    CategoryNotFound(Uuid),

    /// The acting employee is not the step's assigned approver.
    #[error("User {user_id} is not the assigned approver for this step")]
    NotAssignedApprover {
        /// The user who attempted to act.
        user_id: Uuid,
    },

    /// Only the owner of an expense may submit it.
    #[error("User {user_id} does not own this expense")]
    NotExpenseOwner {
        /// The user who attempted to submit.
        user_id: Uuid,
    },

    /// The viewer's scope does not include the expense.
    #[error("User {user_id} is not allowed to view this expense")]
    NotAuthorizedToView {
        /// The user who attempted to view.
        user_id: Uuid,
    },

    /// The step was already approved or rejected.
    #[error("Approval step {step_id} is already {status}")]
    StepAlreadyResolved {
        /// The step.
        step_id: Uuid,
        /// Its current status.
        status: StepStatus,
    },

    /// An earlier tier has not been fully approved yet.
    #[error("Approval step {step_id} at sequence {sequence} is waiting on earlier approvals")]
    StepNotActionable {
        /// The step.
        step_id: Uuid,
        /// Its tier.
        sequence: i32,
    },

    /// Neither the management chain nor any rule produced an approver.
    #[error("No approval path found for expense {expense_id}")]
    NoApprovalPath {
        /// The expense being submitted.
        expense_id: Uuid,
    },

    /// Assigning this manager would make the hierarchy cyclic.
    #[error("Assigning manager {manager_id} to employee {employee_id} would create a cycle")]
    HierarchyCycle {
        /// The employee being re-parented.
        employee_id: Uuid,
        /// The proposed manager.
        manager_id: Uuid,
    },

    /// A referenced entity belongs to another company.
    #[error("Cross-company reference: {0}")]
    CrossCompanyReference(String),

    /// The approval rule configuration is invalid.
    #[error("Invalid approval rule: {0}")]
    InvalidRule(String),

    /// The amount or exchange rate is invalid.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A required field is missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The expense changed underneath this operation.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::CrossCompanyReference(_)
            | Self::InvalidRule(_)
            | Self::InvalidAmount(_)
            | Self::InvalidInput(_) => 400,

            Self::NotAssignedApprover { .. }
            | Self::NotExpenseOwner { .. }
            | Self::NotAuthorizedToView { .. } => 403,

            Self::ExpenseNotFound(_)
            | Self::StepNotFound(_)
            | Self::EmployeeNotFound(_)
            | Self::CompanyNotFound(_)
            | Self::CategoryNotFound(_) => 404,

            Self::StepAlreadyResolved { .. } | Self::Conflict(_) => 409,

            Self::StepNotActionable { .. }
            | Self::NoApprovalPath { .. }
            | Self::HierarchyCycle { .. } => 422,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::StepNotFound(_) => "STEP_NOT_FOUND",
            Self::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::NotAssignedApprover { .. } => "NOT_ASSIGNED_APPROVER",
            Self::NotExpenseOwner { .. } => "NOT_EXPENSE_OWNER",
            Self::NotAuthorizedToView { .. } => "NOT_AUTHORIZED_TO_VIEW",
            Self::StepAlreadyResolved { .. } => "STEP_ALREADY_RESOLVED",
            Self::StepNotActionable { .. } => "STEP_NOT_ACTIONABLE",
            Self::NoApprovalPath { .. } => "NO_APPROVAL_PATH",
            Self::HierarchyCycle { .. } => "HIERARCHY_CYCLE",
            Self::CrossCompanyReference(_) => "CROSS_COMPANY_REFERENCE",
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if re-running the operation against fresh state may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err.status_code() {
            400 => Self::Validation(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 if err.is_retryable() => Self::Conflict(message),
            409 | 422 => Self::BusinessRule(message),
            _ => Self::Database(message),
        }
    }
}
