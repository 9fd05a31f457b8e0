//! Company and expense category repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use spendflow_core::workflow::WorkflowError;
use spendflow_shared::types::{CompanyId, CurrencyCode, ExpenseCategoryId};
use uuid::Uuid;

use super::db_err;
use crate::entities::{companies, expense_categories};

/// Input for creating a company.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    /// Display name.
    pub name: String,
    /// Country name as picked from the external country list.
    pub country: Option<String>,
    /// Reporting currency; every expense is converted into it.
    pub currency: CurrencyCode,
}

/// Input for creating an expense category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Category name, unique per company.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the insert fails.
    pub async fn create_company(
        &self,
        input: CreateCompanyInput,
    ) -> Result<companies::Model, WorkflowError> {
        if input.name.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "company name must not be empty".into(),
            ));
        }

        let now = Utc::now().into();
        let company = companies::ActiveModel {
            id: Set(CompanyId::new().into_inner()),
            name: Set(input.name.trim().to_string()),
            country: Set(input.country),
            currency: Set(input.currency.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = company.insert(&self.db).await.map_err(db_err)?;
        tracing::info!(company_id = %created.id, currency = %created.currency, "Company created");
        Ok(created)
    }

    /// Gets a company by ID.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if it does not exist.
    pub async fn get_company(&self, company_id: Uuid) -> Result<companies::Model, WorkflowError> {
        companies::Entity::find_by_id(company_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CompanyNotFound(company_id))
    }

    /// Creates an expense category.
    ///
    /// # Errors
    ///
    /// Returns an error if the company does not exist or the name is taken.
    pub async fn create_category(
        &self,
        company_id: Uuid,
        input: CreateCategoryInput,
    ) -> Result<expense_categories::Model, WorkflowError> {
        self.get_company(company_id).await?;

        let category = expense_categories::ActiveModel {
            id: Set(ExpenseCategoryId::new().into_inner()),
            company_id: Set(company_id),
            name: Set(input.name),
            description: Set(input.description),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };

        category.insert(&self.db).await.map_err(db_err)
    }

    /// Lists the active categories of a company by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_categories(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<expense_categories::Model>, WorkflowError> {
        expense_categories::Entity::find()
            .filter(expense_categories::Column::CompanyId.eq(company_id))
            .filter(expense_categories::Column::IsActive.eq(true))
            .order_by_asc(expense_categories::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Gets a category of a company.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if it does not exist in that company.
    pub async fn get_category(
        &self,
        company_id: Uuid,
        category_id: Uuid,
    ) -> Result<expense_categories::Model, WorkflowError> {
        expense_categories::Entity::find_by_id(category_id)
            .filter(expense_categories::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CategoryNotFound(category_id))
    }
}
