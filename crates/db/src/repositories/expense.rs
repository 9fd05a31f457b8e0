//! Expense repository.
//!
//! Creates draft expenses and answers the read side of the workflow:
//! visible expenses per viewer and the detail view with step gating.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use spendflow_core::access::ExpenseScope;
use spendflow_core::currency::to_company_currency;
use spendflow_core::workflow::{ApprovalStep, SequentialGate, WorkflowError};
use spendflow_shared::types::money::{rate_to_micros, to_minor_units};
use spendflow_shared::types::{ApprovalStepId, CurrencyCode, EmployeeId, ExpenseId, Money};
use uuid::Uuid;

use super::db_err;
use super::employee::{find_in_company, find_many, load_org_chart, management_chain, ChainMember};
use crate::entities::{
    approval_steps, companies, expense_categories, expenses,
    sea_orm_active_enums::ExpenseStatus,
};

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Category, if any. Must belong to the same company.
    pub category_id: Option<Uuid>,
    /// Short title.
    pub title: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Amount in the currency it was paid in.
    pub amount: Money,
    /// Rate from `amount.currency` to the company currency. Ignored when
    /// the currencies match.
    pub exchange_rate: Decimal,
}

/// An approval step with display data.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    /// The step row.
    pub step: approval_steps::Model,
    /// Approver's name.
    pub approver_name: String,
    /// Whether the approver may act on the step right now.
    pub is_actionable: bool,
}

/// Everything needed to render one expense.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseDetails {
    /// The expense row.
    pub expense: expenses::Model,
    /// Steps ordered by sequence.
    pub steps: Vec<StepView>,
    /// The owner's managers, nearest first.
    pub management_chain: Vec<ChainMember>,
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft expense owned by `employee_id`.
    ///
    /// The amount is converted into the company currency at the supplied
    /// rate and both figures are stored in minor units.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The title is blank
    /// - The employee or category is not part of the company
    /// - The amount is negative or the rate is not positive
    pub async fn create_expense(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        input: CreateExpenseInput,
    ) -> Result<expenses::Model, WorkflowError> {
        if input.title.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "expense title must not be empty".into(),
            ));
        }

        let company = companies::Entity::find_by_id(company_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CompanyNotFound(company_id))?;
        find_in_company(&self.db, company_id, employee_id).await?;

        if let Some(category_id) = input.category_id {
            expense_categories::Entity::find_by_id(category_id)
                .filter(expense_categories::Column::CompanyId.eq(company_id))
                .one(&self.db)
                .await
                .map_err(db_err)?
                .ok_or(WorkflowError::CategoryNotFound(category_id))?;
        }

        let company_currency =
            CurrencyCode::parse(&company.currency).map_err(WorkflowError::InvalidInput)?;
        let (converted, rate) = to_company_currency(input.amount, company_currency, input.exchange_rate)?;

        let out_of_range = || WorkflowError::InvalidAmount("amount is out of range".into());
        let amount_minor = to_minor_units(input.amount.amount).ok_or_else(out_of_range)?;
        let converted_minor = to_minor_units(converted.amount).ok_or_else(out_of_range)?;
        let rate_micros = rate_to_micros(rate)
            .ok_or_else(|| WorkflowError::InvalidAmount("exchange rate is out of range".into()))?;

        let now = Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(ExpenseId::new().into_inner()),
            company_id: Set(company_id),
            employee_id: Set(employee_id),
            category_id: Set(input.category_id),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            expense_date: Set(input.expense_date),
            amount_minor: Set(amount_minor),
            currency: Set(input.amount.currency.to_string()),
            amount_in_company_currency_minor: Set(converted_minor),
            exchange_rate_micros: Set(rate_micros),
            status: Set(ExpenseStatus::Draft),
            version: Set(0),
            submitted_at: Set(None),
            paid_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = expense.insert(&self.db).await.map_err(db_err)?;
        tracing::info!(
            expense_id = %created.id,
            employee_id = %employee_id,
            amount_minor = created.amount_minor,
            currency = %created.currency,
            "Expense created"
        );
        Ok(created)
    }

    /// Gets an expense of a company.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` if it does not exist in the company.
    pub async fn get_expense(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
    ) -> Result<expenses::Model, WorkflowError> {
        find_expense(&self.db, company_id, expense_id).await
    }

    /// Lists the expenses `viewer_id` may see, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the viewer is not part of the company.
    pub async fn list_visible_expenses(
        &self,
        company_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<expenses::Model>, WorkflowError> {
        let scope = self.scope_for(company_id, viewer_id).await?;

        let mut query =
            expenses::Entity::find().filter(expenses::Column::CompanyId.eq(company_id));
        if let Some(owners) = scope.owner_filter() {
            query = query.filter(
                expenses::Column::EmployeeId.is_in(owners.into_iter().map(EmployeeId::into_inner)),
            );
        }

        query
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Loads an expense with its steps and the owner's management chain.
    ///
    /// Visible to anyone whose scope includes the owner and to every
    /// approver assigned a step on it.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthorizedToView` if neither applies.
    pub async fn expense_details(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<ExpenseDetails, WorkflowError> {
        let expense = find_expense(&self.db, company_id, expense_id).await?;
        let scope = self.scope_for(company_id, viewer_id).await?;
        let rows = load_steps(&self.db, expense_id).await.map_err(db_err)?;

        let is_approver = rows.iter().any(|s| s.approver_id == viewer_id);
        if !scope.includes(EmployeeId::from(expense.employee_id)) && !is_approver {
            return Err(WorkflowError::NotAuthorizedToView { user_id: viewer_id });
        }

        let domain: Vec<ApprovalStep> = rows.iter().map(step_to_domain).collect();
        let approver_ids: Vec<Uuid> = rows.iter().map(|s| s.approver_id).collect();
        let approvers = find_many(&self.db, &approver_ids).await.map_err(db_err)?;

        let steps = rows
            .into_iter()
            .zip(domain.iter())
            .map(|(step, as_domain)| StepView {
                approver_name: approvers
                    .get(&step.approver_id)
                    .map(|e| e.name.clone())
                    .unwrap_or_default(),
                is_actionable: SequentialGate::is_actionable(as_domain, &domain),
                step,
            })
            .collect();

        let management_chain = management_chain(&self.db, company_id, expense.employee_id)
            .await
            .map_err(db_err)?;

        Ok(ExpenseDetails {
            expense,
            steps,
            management_chain,
        })
    }

    async fn scope_for(
        &self,
        company_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<ExpenseScope, WorkflowError> {
        let viewer = find_in_company(&self.db, company_id, viewer_id).await?;
        let chart = load_org_chart(&self.db, company_id)
            .await
            .map_err(db_err)?;
        Ok(ExpenseScope::for_viewer(
            &chart,
            EmployeeId::from(viewer_id),
            viewer.role.into(),
        ))
    }
}

/// Loads an expense and checks it belongs to `company_id`.
pub(crate) async fn find_expense<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    expense_id: Uuid,
) -> Result<expenses::Model, WorkflowError> {
    expenses::Entity::find_by_id(expense_id)
        .filter(expenses::Column::CompanyId.eq(company_id))
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::ExpenseNotFound(expense_id))
}

/// Loads the steps of an expense ordered by sequence.
pub(crate) async fn load_steps<C: ConnectionTrait>(
    conn: &C,
    expense_id: Uuid,
) -> Result<Vec<approval_steps::Model>, DbErr> {
    approval_steps::Entity::find()
        .filter(approval_steps::Column::ExpenseId.eq(expense_id))
        .order_by_asc(approval_steps::Column::Sequence)
        .order_by_asc(approval_steps::Column::Id)
        .all(conn)
        .await
}

pub(crate) fn step_to_domain(model: &approval_steps::Model) -> ApprovalStep {
    ApprovalStep {
        id: ApprovalStepId::from(model.id),
        expense_id: ExpenseId::from(model.expense_id),
        approver_id: EmployeeId::from(model.approver_id),
        sequence: model.sequence,
        status: model.status.into(),
        comment: model.comment.clone(),
        decided_at: model.decided_at.map(|d| d.with_timezone(&Utc)),
    }
}
