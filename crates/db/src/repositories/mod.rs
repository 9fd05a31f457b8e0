//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod approval_rule;
pub mod company;
pub mod employee;
pub mod expense;
pub mod workflow;

pub use approval_rule::{
    ApprovalRuleError, ApprovalRuleRepository, CreateApprovalRuleInput, RuleWithApprovers,
    UpdateApprovalRuleInput,
};
pub use company::{CompanyRepository, CreateCategoryInput, CreateCompanyInput};
pub use employee::{ChainMember, CreateEmployeeInput, EmployeeRepository};
pub use expense::{CreateExpenseInput, ExpenseDetails, ExpenseRepository, StepView};
pub use workflow::{DecisionOutcome, PendingApproval, SubmitOutcome, WorkflowRepository};

use sea_orm::DbErr;
use spendflow_core::workflow::WorkflowError;

pub(crate) fn db_err(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}
