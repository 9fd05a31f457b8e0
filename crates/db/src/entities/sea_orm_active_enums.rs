//! `SeaORM` active enums, stored as lowercase strings.
//!
//! Each enum mirrors a `spendflow_core` type and converts both ways.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use spendflow_core::workflow as domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum EmployeeRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "employee")]
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "pending_approval")]
    PendingApproval,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum StepStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ApprovalRuleKind {
    #[sea_orm(string_value = "specific_approver")]
    SpecificApprover,
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "hybrid")]
    Hybrid,
}

impl From<EmployeeRole> for domain::EmployeeRole {
    fn from(role: EmployeeRole) -> Self {
        match role {
            EmployeeRole::Admin => Self::Admin,
            EmployeeRole::Manager => Self::Manager,
            EmployeeRole::Employee => Self::Employee,
        }
    }
}

impl From<domain::EmployeeRole> for EmployeeRole {
    fn from(role: domain::EmployeeRole) -> Self {
        match role {
            domain::EmployeeRole::Admin => Self::Admin,
            domain::EmployeeRole::Manager => Self::Manager,
            domain::EmployeeRole::Employee => Self::Employee,
        }
    }
}

impl From<ExpenseStatus> for domain::ExpenseStatus {
    fn from(status: ExpenseStatus) -> Self {
        match status {
            ExpenseStatus::Draft => Self::Draft,
            ExpenseStatus::Submitted => Self::Submitted,
            ExpenseStatus::PendingApproval => Self::PendingApproval,
            ExpenseStatus::Approved => Self::Approved,
            ExpenseStatus::Rejected => Self::Rejected,
            ExpenseStatus::Paid => Self::Paid,
        }
    }
}

impl From<domain::ExpenseStatus> for ExpenseStatus {
    fn from(status: domain::ExpenseStatus) -> Self {
        match status {
            domain::ExpenseStatus::Draft => Self::Draft,
            domain::ExpenseStatus::Submitted => Self::Submitted,
            domain::ExpenseStatus::PendingApproval => Self::PendingApproval,
            domain::ExpenseStatus::Approved => Self::Approved,
            domain::ExpenseStatus::Rejected => Self::Rejected,
            domain::ExpenseStatus::Paid => Self::Paid,
        }
    }
}

impl From<StepStatus> for domain::StepStatus {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Pending => Self::Pending,
            StepStatus::Approved => Self::Approved,
            StepStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<domain::StepStatus> for StepStatus {
    fn from(status: domain::StepStatus) -> Self {
        match status {
            domain::StepStatus::Pending => Self::Pending,
            domain::StepStatus::Approved => Self::Approved,
            domain::StepStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<ApprovalRuleKind> for domain::ApprovalRuleKind {
    fn from(kind: ApprovalRuleKind) -> Self {
        match kind {
            ApprovalRuleKind::SpecificApprover => Self::SpecificApprover,
            ApprovalRuleKind::Percentage => Self::Percentage,
            ApprovalRuleKind::Hybrid => Self::Hybrid,
        }
    }
}

impl From<domain::ApprovalRuleKind> for ApprovalRuleKind {
    fn from(kind: domain::ApprovalRuleKind) -> Self {
        match kind {
            domain::ApprovalRuleKind::SpecificApprover => Self::SpecificApprover,
            domain::ApprovalRuleKind::Percentage => Self::Percentage,
            domain::ApprovalRuleKind::Hybrid => Self::Hybrid,
        }
    }
}
