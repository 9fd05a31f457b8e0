//! Entity re-exports.

pub use super::approval_rule_approvers::Entity as ApprovalRuleApprovers;
pub use super::approval_rules::Entity as ApprovalRules;
pub use super::approval_steps::Entity as ApprovalSteps;
pub use super::companies::Entity as Companies;
pub use super::employees::Entity as Employees;
pub use super::expense_categories::Entity as ExpenseCategories;
pub use super::expenses::Entity as Expenses;
