//! Initial schema migration.
//!
//! - `companies`: tenants and their reporting currency
//! - `employees`: people, roles and the self-referential manager link
//! - `expense_categories`: per-company expense categories
//! - `expenses`: claims with original and company-currency amounts
//! - `approval_rules`: amount-banded routing rules
//! - `approval_rule_approvers`: approver lists of percentage/hybrid rules
//! - `approval_steps`: the per-expense approval plan

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Companies {
    Table,
    Id,
    Name,
    Country,
    Currency,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Employees {
    Table,
    Id,
    CompanyId,
    Name,
    Email,
    Role,
    ManagerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExpenseCategories {
    Table,
    Id,
    CompanyId,
    Name,
    Description,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    CompanyId,
    EmployeeId,
    CategoryId,
    Title,
    Description,
    ExpenseDate,
    AmountMinor,
    Currency,
    AmountInCompanyCurrencyMinor,
    ExchangeRateMicros,
    Status,
    Version,
    SubmittedAt,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ApprovalRules {
    Table,
    Id,
    CompanyId,
    Name,
    Description,
    Kind,
    MinAmountMinor,
    MaxAmountMinor,
    Sequence,
    SpecificApproverId,
    PercentageRequired,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ApprovalRuleApprovers {
    Table,
    Id,
    RuleId,
    ApproverId,
    Sequence,
}

#[derive(Iden)]
enum ApprovalSteps {
    Table,
    Id,
    ExpenseId,
    ApproverId,
    Sequence,
    Status,
    Comment,
    DecidedAt,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // companies
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Companies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Companies::Name).string().not_null())
                    .col(ColumnDef::new(Companies::Country).string())
                    .col(ColumnDef::new(Companies::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Companies::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // employees
        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Employees::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Employees::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Employees::Name).string().not_null())
                    .col(
                        ColumnDef::new(Employees::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Employees::Role)
                            .string()
                            .not_null()
                            .default("employee"),
                    )
                    .col(ColumnDef::new(Employees::ManagerId).uuid())
                    .col(
                        ColumnDef::new(Employees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-employees-company_id")
                            .from(Employees::Table, Employees::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-employees-manager_id")
                            .from(Employees::Table, Employees::ManagerId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-employees-manager_id")
                    .table(Employees::Table)
                    .col(Employees::ManagerId)
                    .to_owned(),
            )
            .await?;

        // expense_categories
        manager
            .create_table(
                Table::create()
                    .table(ExpenseCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseCategories::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseCategories::Name).string().not_null())
                    .col(ColumnDef::new(ExpenseCategories::Description).string())
                    .col(
                        ColumnDef::new(ExpenseCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ExpenseCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_categories-company_id")
                            .from(ExpenseCategories::Table, ExpenseCategories::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_categories-company_id-name-unique")
                    .table(ExpenseCategories::Table)
                    .col(ExpenseCategories::CompanyId)
                    .col(ExpenseCategories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // expenses
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::EmployeeId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::CategoryId).uuid())
                    .col(ColumnDef::new(Expenses::Title).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).text())
                    .col(ColumnDef::new(Expenses::ExpenseDate).date().not_null())
                    .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Expenses::AmountInCompanyCurrencyMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::ExchangeRateMicros)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::Status)
                            .string()
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Expenses::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Expenses::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Expenses::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-company_id")
                            .from(Expenses::Table, Expenses::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-employee_id")
                            .from(Expenses::Table, Expenses::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-category_id")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(ExpenseCategories::Table, ExpenseCategories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-company_id-status")
                    .table(Expenses::Table)
                    .col(Expenses::CompanyId)
                    .col(Expenses::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-employee_id")
                    .table(Expenses::Table)
                    .col(Expenses::EmployeeId)
                    .to_owned(),
            )
            .await?;

        // approval_rules
        manager
            .create_table(
                Table::create()
                    .table(ApprovalRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApprovalRules::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ApprovalRules::Name).string().not_null())
                    .col(ColumnDef::new(ApprovalRules::Description).string())
                    .col(ColumnDef::new(ApprovalRules::Kind).string().not_null())
                    .col(
                        ColumnDef::new(ApprovalRules::MinAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ApprovalRules::MaxAmountMinor).big_integer())
                    .col(
                        ColumnDef::new(ApprovalRules::Sequence)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(ApprovalRules::SpecificApproverId).uuid())
                    .col(ColumnDef::new(ApprovalRules::PercentageRequired).small_integer())
                    .col(
                        ColumnDef::new(ApprovalRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ApprovalRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalRules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-approval_rules-company_id")
                            .from(ApprovalRules::Table, ApprovalRules::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-approval_rules-specific_approver_id")
                            .from(ApprovalRules::Table, ApprovalRules::SpecificApproverId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-approval_rules-company_id-sequence")
                    .table(ApprovalRules::Table)
                    .col(ApprovalRules::CompanyId)
                    .col(ApprovalRules::Sequence)
                    .to_owned(),
            )
            .await?;

        // approval_rule_approvers
        manager
            .create_table(
                Table::create()
                    .table(ApprovalRuleApprovers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalRuleApprovers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApprovalRuleApprovers::RuleId).uuid().not_null())
                    .col(
                        ColumnDef::new(ApprovalRuleApprovers::ApproverId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApprovalRuleApprovers::Sequence)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-approval_rule_approvers-rule_id")
                            .from(ApprovalRuleApprovers::Table, ApprovalRuleApprovers::RuleId)
                            .to(ApprovalRules::Table, ApprovalRules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-approval_rule_approvers-approver_id")
                            .from(
                                ApprovalRuleApprovers::Table,
                                ApprovalRuleApprovers::ApproverId,
                            )
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-approval_rule_approvers-rule_id-approver_id-unique")
                    .table(ApprovalRuleApprovers::Table)
                    .col(ApprovalRuleApprovers::RuleId)
                    .col(ApprovalRuleApprovers::ApproverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // approval_steps
        manager
            .create_table(
                Table::create()
                    .table(ApprovalSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApprovalSteps::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApprovalSteps::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(ApprovalSteps::ApproverId).uuid().not_null())
                    .col(ColumnDef::new(ApprovalSteps::Sequence).integer().not_null())
                    .col(
                        ColumnDef::new(ApprovalSteps::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ApprovalSteps::Comment).text())
                    .col(ColumnDef::new(ApprovalSteps::DecidedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ApprovalSteps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-approval_steps-expense_id")
                            .from(ApprovalSteps::Table, ApprovalSteps::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-approval_steps-approver_id")
                            .from(ApprovalSteps::Table, ApprovalSteps::ApproverId)
                            .to(Employees::Table, Employees::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-approval_steps-expense_id-approver_id-unique")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::ExpenseId)
                    .col(ApprovalSteps::ApproverId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-approval_steps-approver_id-status")
                    .table(ApprovalSteps::Table)
                    .col(ApprovalSteps::ApproverId)
                    .col(ApprovalSteps::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApprovalSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalRuleApprovers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalRules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;
        Ok(())
    }
}
