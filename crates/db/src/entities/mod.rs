//! `SeaORM` entity definitions.
//!
//! Models mirror the table columns one to one; the schema itself is
//! documented in the migration.

#![allow(missing_docs)]

pub mod prelude;

pub mod approval_rule_approvers;
pub mod approval_rules;
pub mod approval_steps;
pub mod companies;
pub mod employees;
pub mod expense_categories;
pub mod expenses;
pub mod sea_orm_active_enums;
