//! Multi-level approval workflow for expenses.
//!
//! Submission turns an expense into an ordered list of approval steps built
//! from the submitter's management chain followed by every amount-banded
//! rule that matches. Steps sharing a `sequence` form one tier; a tier only
//! becomes actionable once every earlier tier is fully approved, and the
//! expense status is recomputed from the full step set after each decision.
//!
//! # Modules
//!
//! - `types` - Statuses, steps and workflow actions
//! - `error` - Workflow-specific error types
//! - `hierarchy` - Management chain and subtree traversal
//! - `rules` - Approval rules and band matching
//! - `builder` - Turns chain + rules into an approval plan
//! - `gate` - Sequential tier gating
//! - `aggregate` - Expense status from step outcomes
//! - `service` - State transitions and step decisions

pub mod aggregate;
pub mod builder;
pub mod error;
pub mod gate;
pub mod hierarchy;
pub mod rules;
pub mod service;
pub mod types;

#[cfg(test)]
mod builder_props;
#[cfg(test)]
mod hierarchy_props;
#[cfg(test)]
mod status_props;

pub use aggregate::StatusAggregator;
pub use builder::{PlannedStep, StepSource, WorkflowBuilder, WorkflowPlan};
pub use error::WorkflowError;
pub use gate::SequentialGate;
pub use hierarchy::{ChainLink, HierarchyResolver, OrgChart};
pub use rules::{ApprovalRule, ApprovalRuleKind, RuleApprover, RuleEngine, RulePolicy};
pub use service::WorkflowService;
pub use types::{
    ApprovalStep, EmployeeRole, ExpenseStatus, StepDecision, StepStatus, WorkflowAction,
};
